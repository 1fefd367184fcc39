use crate::detection::{iou, RawDetection};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Greedy, confidence-first non-maximum suppression.
///
/// Repeatedly keeps the most confident remaining detection and discards
/// every remaining one whose IoU with it is strictly greater than
/// `iou_threshold`. Output is ordered by descending confidence. NaN
/// confidences rank below everything else.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(detections), fields(n = detections.len()))
)]
pub fn non_max_suppression(
    mut detections: Vec<RawDetection>,
    iou_threshold: f32,
) -> Vec<RawDetection> {
    detections.sort_by(|a, b| rank(a).total_cmp(&rank(b)));

    let mut keep = Vec::with_capacity(detections.len());
    while let Some(best) = detections.pop() {
        detections.retain(|d| iou(&best, d) <= iou_threshold);
        keep.push(best);
    }
    keep
}

fn rank(d: &RawDetection) -> f32 {
    if d.confidence.is_nan() {
        f32::NEG_INFINITY
    } else {
        d.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, y: f32, w: f32, h: f32, confidence: f32) -> RawDetection {
        RawDetection {
            x_center: x,
            y_center: y,
            width: w,
            height: h,
            confidence,
            class_id: 0,
        }
    }

    #[test]
    fn empty_input() {
        assert!(non_max_suppression(Vec::new(), 0.5).is_empty());
    }

    #[test]
    fn iou_equal_to_threshold_keeps_both() {
        // IoU is exactly 0.25.
        let a = det(5.0, 5.0, 10.0, 10.0, 0.9);
        let b = det(11.0, 5.0, 10.0, 10.0, 0.8);
        let kept = non_max_suppression(vec![a, b], 0.25);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn full_overlap_removes_weaker() {
        let strong = det(5.0, 5.0, 10.0, 10.0, 0.9);
        let weak = det(5.0, 5.0, 10.0, 10.0, 0.3);
        let kept = non_max_suppression(vec![weak, strong], 0.99);
        assert_eq!(kept, vec![strong]);
    }

    #[test]
    fn touching_boxes_survive_any_threshold() {
        let a = det(5.0, 5.0, 10.0, 10.0, 0.9);
        let b = det(15.0, 5.0, 10.0, 10.0, 0.8);
        let kept = non_max_suppression(vec![a, b], 0.0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn adjacent_suppressed_candidates_are_all_removed() {
        // Three consecutive overlapping boxes after the winner: an
        // erase-while-advancing loop would skip every second one.
        let winner = det(50.0, 50.0, 20.0, 20.0, 0.95);
        let dets = vec![
            det(51.0, 50.0, 20.0, 20.0, 0.6),
            det(52.0, 50.0, 20.0, 20.0, 0.7),
            det(49.0, 50.0, 20.0, 20.0, 0.8),
            winner,
            det(200.0, 200.0, 20.0, 20.0, 0.5),
        ];
        let kept = non_max_suppression(dets, 0.5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], winner);
        assert_eq!(kept[1].x_center, 200.0);
    }

    #[test]
    fn kept_confidence_dominates_suppressed() {
        let dets: Vec<RawDetection> = (0..12)
            .map(|i| {
                let f = i as f32;
                det(10.0 + 3.0 * (f % 4.0), 10.0 + 2.0 * f, 12.0, 12.0, 0.05 + 0.07 * f)
            })
            .collect();
        let kept = non_max_suppression(dets.clone(), 0.3);
        for d in &dets {
            if kept.contains(d) {
                continue;
            }
            let suppressor = kept
                .iter()
                .find(|k| iou(k, d) > 0.3)
                .expect("every removed box overlaps a kept one");
            assert!(suppressor.confidence >= d.confidence);
        }
        for w in kept.windows(2) {
            assert!(w[0].confidence >= w[1].confidence);
        }
    }

    #[test]
    fn nan_confidence_ranks_last() {
        let nan = det(5.0, 5.0, 10.0, 10.0, f32::NAN);
        let ok = det(5.0, 5.0, 10.0, 10.0, 0.1);
        let kept = non_max_suppression(vec![nan, ok], 0.5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.1);
    }
}
