//! Candidate enumeration over a frame's light bars.

use armor_vision_core::{pair, point_in_polygon, Armor, LightBar};
use serde::{Deserialize, Serialize};

/// Acceptance window for two light bars forming one plate.
///
/// Distances are relative to the mean bar length, so the same values hold
/// near and far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingParams {
    /// Maximum difference of the two tilts, degrees.
    pub max_angle_diff: f32,
    /// Maximum ratio of the longer to the shorter bar.
    pub max_length_ratio: f32,
    /// Maximum vertical offset of the centres.
    pub max_center_offset_y: f32,
    /// Horizontal centre distance window.
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for PairingParams {
    fn default() -> Self {
        Self {
            max_angle_diff: 10.0,
            max_length_ratio: 1.8,
            max_center_offset_y: 0.6,
            min_distance: 0.8,
            max_distance: 5.0,
        }
    }
}

impl PairingParams {
    /// Geometric acceptance of `left` (smaller x) and `right`.
    pub fn accepts(&self, left: &LightBar, right: &LightBar) -> bool {
        if (left.tilt() - right.tilt()).abs() > self.max_angle_diff {
            return false;
        }
        let (long, short) = if left.length() >= right.length() {
            (left.length(), right.length())
        } else {
            (right.length(), left.length())
        };
        if long / short > self.max_length_ratio {
            return false;
        }

        let mean = 0.5 * (left.length() + right.length());
        let d = right.image_center() - left.image_center();
        if d.y.abs() > self.max_center_offset_y * mean {
            return false;
        }
        let dx = d.x / mean;
        dx >= self.min_distance && dx <= self.max_distance
    }
}

/// Every accepted pair of `bars`, left bar first.
///
/// A pair is dropped when the centre of any other bar falls inside the plate
/// it would form.
pub fn find_armors(bars: &[LightBar], params: &PairingParams) -> Vec<Armor> {
    let mut sorted = bars.to_vec();
    sorted.sort_by(|a, b| a.image_center().x.total_cmp(&b.image_center().x));

    let mut armors = Vec::new();
    for (i, left) in sorted.iter().enumerate() {
        for (j, right) in sorted.iter().enumerate().skip(i + 1) {
            if !params.accepts(left, right) {
                continue;
            }
            let armor = pair(*left, *right);
            let polygon = armor.image_vertices();
            let blocked = sorted.iter().enumerate().any(|(k, other)| {
                k != i && k != j && point_in_polygon(other.image_center(), &polygon)
            });
            if !blocked {
                armors.push(armor);
            }
        }
    }
    armors
}
