//! Greedy non-maximum suppression

use std::cmp::Ordering;

use super::detection::Detection;

/// Keeps the strongest box of every group of overlapping boxes
///
/// Boxes are visited by descending confidence (ties keep input order); a
/// box is dropped when its IoU with an already kept box exceeds
/// `iou_threshold`. The result is ordered by descending confidence.
pub fn non_max_suppression(detections: &[Detection], iou_threshold: f64) -> Vec<Detection> {
    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| {
        detections[b].confidence
            .partial_cmp(&detections[a].confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for index in order {
        let candidate = detections[index];
        if kept.iter().all(|k| k.bbox.iou(&candidate.bbox) <= iou_threshold) {
            kept.push(candidate);
        }
    }

    kept
}
