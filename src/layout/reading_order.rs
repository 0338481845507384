use crate::models::{Bubble, Detection, Rect};
use tracing::debug;

/// Index of the bubble whose center is nearest (Manhattan) to `rect`'s
/// center. Ties go to the earlier bubble.
pub fn nearest_bubble(rect: &Rect, bubbles: &[Rect]) -> Option<usize> {
    bubbles
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| rect.center_distance(a).total_cmp(&rect.center_distance(b)))
        .map(|(i, _)| i)
}

/// Sort member indices top edge first, then left edge.
pub fn reading_sort(members: &mut [usize], detections: &[Detection]) {
    members.sort_by_key(|&i| (detections[i].rect.y, detections[i].rect.x));
}

/// Assign every detection to one bubble, order each bubble's members for
/// reading and join their texts with single spaces.
///
/// A bubble rect that receives no members is dropped; the stored rect is the
/// tight union of the members.
pub fn sequence(detections: &[Detection], bubble_rects: &[Rect]) -> Vec<Bubble> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); bubble_rects.len()];
    for (index, detection) in detections.iter().enumerate() {
        if let Some(b) = nearest_bubble(&detection.rect, bubble_rects) {
            members[b].push(index);
        }
    }

    let bubbles: Vec<Bubble> = members
        .into_iter()
        .filter(|m| !m.is_empty())
        .map(|mut m| {
            reading_sort(&mut m, detections);
            let rect = m
                .iter()
                .map(|&i| detections[i].rect)
                .reduce(|acc, r| acc.union(&r))
                .unwrap_or_default();
            let text = m
                .iter()
                .map(|&i| detections[i].text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            Bubble {
                rect,
                member_indices: m,
                text,
            }
        })
        .collect();

    debug!(
        detections = detections.len(),
        bubbles = bubbles.len(),
        "reading order assigned"
    );
    bubbles
}
