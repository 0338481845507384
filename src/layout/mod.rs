pub mod cluster;
pub mod reading_order;

use crate::models::{Bubble, Detection, Rect};

pub use cluster::BubbleClusterer;
pub use reading_order::{nearest_bubble, reading_sort, sequence};

/// Cluster a page's detections and sequence them into bubbles.
/// No detections means no bubbles.
pub fn form_bubbles(detections: &[Detection], clusterer: &BubbleClusterer) -> Vec<Bubble> {
    let rects: Vec<Rect> = detections.iter().map(|d| d.rect).collect();
    let bubble_rects = clusterer.cluster(&rects);
    sequence(detections, &bubble_rects)
}
