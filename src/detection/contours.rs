use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use crate::models::Rect;

/// Bounding rects of the outermost contours in a binary edge image.
///
/// Holes and anything nested inside another border are skipped. Output is in
/// the raster order the contour tracer discovers borders.
pub fn external_bounding_rects(edges: &GrayImage) -> Vec<Rect> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| {
            let first = c.points.first()?;
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
            for p in &c.points {
                min_x = min_x.min(p.x);
                min_y = min_y.min(p.y);
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
            }
            // Pixel-inclusive bounds, so a single pixel is 1x1.
            Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
        })
        .collect()
}
