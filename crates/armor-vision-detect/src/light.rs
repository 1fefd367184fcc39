use armor_vision_core::{FrameView, LightBar, Team};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::contour::{min_area_rotated_rect, outer_contours};
use crate::mask::team_mask;

/// Light-bar extraction thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightParams {
    /// Required margin of the team channel over the opposing one.
    pub color_threshold: u8,
    /// Minimum value of the team channel.
    pub brightness_threshold: u8,
    /// Minimum `length * width`, px².
    pub min_area: f32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    /// Maximum lean of the long axis away from vertical, degrees.
    pub max_tilt: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            color_threshold: 50,
            brightness_threshold: 120,
            min_area: 20.0,
            min_aspect_ratio: 1.5,
            max_aspect_ratio: 15.0,
            max_tilt: 40.0,
        }
    }
}

impl LightParams {
    pub fn accepts(&self, bar: &LightBar) -> bool {
        let aspect = bar.image_aspect_ratio();
        bar.area() >= self.min_area
            && aspect >= self.min_aspect_ratio
            && aspect <= self.max_aspect_ratio
            && bar.tilt().abs() <= self.max_tilt
    }
}

/// Light bars lit in `team`'s colour, in contour order.
pub fn extract_light_bars(frame: &FrameView, team: Team, params: &LightParams) -> Vec<LightBar> {
    let mask = team_mask(
        frame,
        team,
        params.color_threshold,
        params.brightness_threshold,
    );
    let contours = outer_contours(&mask);
    let bars: Vec<LightBar> = contours
        .iter()
        .filter_map(|c| min_area_rotated_rect(c))
        .map(LightBar::new)
        .filter(|bar| params.accepts(bar))
        .collect();
    trace!("{} contours, {} light bars", contours.len(), bars.len());
    bars
}
