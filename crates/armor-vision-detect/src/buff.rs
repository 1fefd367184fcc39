//! Power rune ("buff") detector.
//!
//! The rune is a rotating fan lit in one team colour: a small, roughly square
//! logo marks the rotation centre and rectangular plates sit on a circle
//! around it. Every lit contour is classified as centre or plate candidate by
//! size and shape; the centre candidate whose distances to the plates agree
//! best is taken as the hub.

use armor_vision_core::{label, Color, DrawPrimitive, FrameView, RotatedRect, StageTimer, Team};
use log::{debug, error};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::contour::{min_area_rotated_rect, outer_contours, polygon_moments};
use crate::detector::Detector;
use crate::mask::team_mask;
use crate::render::Canvas;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffParams {
    pub color_threshold: u8,
    pub brightness_threshold: u8,
    /// Contour area window of the centre logo, px².
    pub min_center_area: f32,
    pub max_center_area: f32,
    /// Maximum long/short side ratio of the centre logo.
    pub max_center_aspect: f32,
    /// Contour area window of a plate, px².
    pub min_armor_area: f32,
    pub max_armor_area: f32,
    pub min_armor_aspect: f32,
    pub max_armor_aspect: f32,
    /// Plates must sit at least this many plate lengths from the hub.
    pub min_radius_ratio: f32,
}

impl Default for BuffParams {
    fn default() -> Self {
        Self {
            color_threshold: 50,
            brightness_threshold: 120,
            min_center_area: 30.0,
            max_center_area: 600.0,
            max_center_aspect: 1.5,
            min_armor_area: 300.0,
            max_armor_area: 8000.0,
            min_armor_aspect: 1.2,
            max_armor_aspect: 3.5,
            min_radius_ratio: 1.0,
        }
    }
}

/// One plate on the fan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuffArmor {
    pub rect: RotatedRect,
    /// Distance from the rotation centre, px.
    pub radius: f32,
    /// Direction from the rotation centre, degrees, image convention.
    pub phase: f32,
}

/// A detected rune: hub and the plates around it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub center: Point2<f32>,
    pub armors: Vec<BuffArmor>,
}

impl Buff {
    /// Mean plate radius; `0` without plates.
    pub fn radius(&self) -> f32 {
        if self.armors.is_empty() {
            return 0.0;
        }
        self.armors.iter().map(|a| a.radius).sum::<f32>() / self.armors.len() as f32
    }
}

struct Blob {
    rect: RotatedRect,
    area: f32,
}

impl Blob {
    fn aspect(&self) -> f32 {
        let long = self.rect.width.max(self.rect.height);
        let short = self.rect.width.min(self.rect.height).max(1e-3);
        long / short
    }

    fn length(&self) -> f32 {
        self.rect.width.max(self.rect.height)
    }
}

#[derive(Debug)]
pub struct BuffDetector {
    params: BuffParams,
    team: Team,
    targets: Vec<Buff>,
    timer: StageTimer,
}

impl BuffDetector {
    pub fn new(params: BuffParams, team: Team) -> Self {
        Self {
            params,
            team,
            targets: Vec::new(),
            timer: StageTimer::new(),
        }
    }

    pub fn params(&self) -> &BuffParams {
        &self.params
    }

    pub fn reset_params(&mut self, params: BuffParams) {
        self.params = params;
        debug!("buff parameters reset");
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn set_team(&mut self, team: Team) {
        self.team = team;
        debug!("buff team set to {team}");
    }

    fn find_buff(&self, frame: &FrameView) -> Option<Buff> {
        let p = &self.params;
        let mask = team_mask(frame, self.team, p.color_threshold, p.brightness_threshold);
        let blobs: Vec<Blob> = outer_contours(&mask)
            .iter()
            .filter_map(|c| {
                let rect = min_area_rotated_rect(c)?;
                let area = polygon_moments(c).m00 as f32;
                Some(Blob { rect, area })
            })
            .collect();

        let centers: Vec<&Blob> = blobs
            .iter()
            .filter(|b| {
                b.area >= p.min_center_area
                    && b.area <= p.max_center_area
                    && b.aspect() <= p.max_center_aspect
            })
            .collect();
        let plates: Vec<&Blob> = blobs
            .iter()
            .filter(|b| {
                b.area >= p.min_armor_area
                    && b.area <= p.max_armor_area
                    && b.aspect() >= p.min_armor_aspect
                    && b.aspect() <= p.max_armor_aspect
            })
            .collect();
        debug!("{} hub and {} plate candidates", centers.len(), plates.len());

        let hub = centers
            .iter()
            .map(|c| {
                let armors = self.plates_around(c.rect.center, &plates);
                (c, spread(&armors), armors)
            })
            .filter(|(_, _, armors)| !armors.is_empty())
            // Most plates first, then the most consistent radius.
            .min_by(|a, b| b.2.len().cmp(&a.2.len()).then(a.1.total_cmp(&b.1)))?;

        Some(Buff {
            center: hub.0.rect.center,
            armors: hub.2,
        })
    }

    fn plates_around(&self, center: Point2<f32>, plates: &[&Blob]) -> Vec<BuffArmor> {
        plates
            .iter()
            .filter_map(|plate| {
                let d = plate.rect.center - center;
                let radius = d.norm();
                if radius < self.params.min_radius_ratio * plate.length() {
                    return None;
                }
                Some(BuffArmor {
                    rect: plate.rect,
                    radius,
                    phase: d.y.atan2(d.x).to_degrees(),
                })
            })
            .collect()
    }
}

/// Standard deviation of the plate radii.
fn spread(armors: &[BuffArmor]) -> f32 {
    if armors.is_empty() {
        return f32::INFINITY;
    }
    let n = armors.len() as f32;
    let mean = armors.iter().map(|a| a.radius).sum::<f32>() / n;
    let var = armors.iter().map(|a| (a.radius - mean).powi(2)).sum::<f32>() / n;
    var.sqrt()
}

impl Detector for BuffDetector {
    type Target = Buff;

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn detect(&mut self, frame: &FrameView<'_>) -> &[Buff] {
        self.targets.clear();
        self.timer.start();
        if frame.is_valid() {
            match self.find_buff(frame) {
                Some(buff) => self.targets.push(buff),
                None => debug!("no buff"),
            }
        } else {
            error!("invalid frame {}x{}", frame.width, frame.height);
        }
        self.timer.stop("find buff");
        &self.targets
    }

    fn targets(&self) -> &[Buff] {
        &self.targets
    }

    fn visualize_result(&self, canvas: &mut Canvas<'_>, verbose: u8) {
        if verbose == 0 {
            return;
        }
        let mut prims = Vec::new();
        if verbose > 1 {
            prims.push(label(format!(
                "{} buffs in {} ms",
                self.targets.len(),
                self.timer.last_ms()
            )));
        }
        for buff in &self.targets {
            prims.push(DrawPrimitive::Circle {
                center: buff.center,
                radius: buff.radius(),
                color: Color::MAGENTA,
                filled: false,
            });
            prims.push(DrawPrimitive::Circle {
                center: buff.center,
                radius: 3.0,
                color: Color::RED,
                filled: true,
            });
            for armor in &buff.armors {
                prims.push(DrawPrimitive::Polygon {
                    points: armor.rect.points().to_vec(),
                    color: Color::GREEN,
                });
                prims.push(DrawPrimitive::Line {
                    from: buff.center,
                    to: armor.rect.center,
                    color: Color::CYAN,
                });
                if verbose > 2 {
                    prims.push(DrawPrimitive::Text {
                        origin: armor.rect.center,
                        text: format!("{:.0} deg", armor.phase),
                        scale: 14.0,
                        color: Color::YELLOW,
                    });
                }
            }
        }
        canvas.draw_all(&prims);
    }
}
