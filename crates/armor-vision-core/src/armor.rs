use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::draw::{Color, DrawPrimitive};
use crate::game::Model;
use crate::light_bar::LightBar;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmorError {
    #[error("armor model already assigned ({current})")]
    ModelAlreadyAssigned { current: Model },
}

/// Armor plate inferred from a left/right light-bar pair.
///
/// Center and angle are pure functions of the two bars. The model starts as
/// [`Model::Unknown`] and may be assigned once by a classifier; an armor read
/// back from JSON with a known model counts as assigned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    left: LightBar,
    right: LightBar,
    center: Point2<f32>,
    angle: f32,
    model: Model,
    #[serde(skip)]
    model_assigned: bool,
}

/// Combine two light bars into an armor. No validity gate is applied here.
pub fn pair(left: LightBar, right: LightBar) -> Armor {
    Armor::new(left, right)
}

impl Armor {
    pub fn new(left: LightBar, right: LightBar) -> Self {
        let (l, r) = (left.image_center(), right.image_center());
        Self {
            left,
            right,
            center: Point2::new(0.5 * (l.x + r.x), 0.5 * (l.y + r.y)),
            angle: 0.5 * (left.image_angle() + right.image_angle()),
            model: Model::Unknown,
            model_assigned: false,
        }
    }

    #[inline]
    pub fn image_center(&self) -> Point2<f32> {
        self.center
    }

    #[inline]
    pub fn image_angle(&self) -> f32 {
        self.angle
    }

    #[inline]
    pub fn model(&self) -> Model {
        self.model
    }

    pub fn set_model(&mut self, model: Model) -> Result<(), ArmorError> {
        if self.model_assigned || self.model != Model::Unknown {
            return Err(ArmorError::ModelAlreadyAssigned {
                current: self.model,
            });
        }
        self.model = model;
        self.model_assigned = true;
        Ok(())
    }

    pub fn left(&self) -> &LightBar {
        &self.left
    }

    pub fn right(&self) -> &LightBar {
        &self.right
    }

    /// Plate corners: left-top, right-top, right-bottom, left-bottom.
    pub fn image_vertices(&self) -> [Point2<f32>; 4] {
        [
            self.left.top(),
            self.right.top(),
            self.right.bottom(),
            self.left.bottom(),
        ]
    }

    /// Distance between the two bar centers.
    pub fn image_width(&self) -> f32 {
        (self.right.image_center() - self.left.image_center()).norm()
    }

    /// Mean light-bar length.
    pub fn image_height(&self) -> f32 {
        0.5 * (self.left.length() + self.right.length())
    }

    /// Overlay primitives for this armor; `add_label` adds model and angle text.
    pub fn visualize_object(&self, add_label: bool) -> Vec<DrawPrimitive> {
        let mut prims = Vec::with_capacity(4);
        prims.push(DrawPrimitive::Polygon {
            points: self.image_vertices().to_vec(),
            color: Color::GREEN,
        });
        prims.push(DrawPrimitive::Circle {
            center: self.center,
            radius: 2.0,
            color: Color::RED,
            filled: true,
        });
        if add_label {
            prims.push(DrawPrimitive::Text {
                origin: self.left.top(),
                text: format!("{} {:.1}", self.model, self.angle),
                scale: 16.0,
                color: Color::YELLOW,
            });
            for v in self.image_vertices() {
                prims.push(DrawPrimitive::Circle {
                    center: v,
                    radius: 3.0,
                    color: Color::CYAN,
                    filled: false,
                });
            }
        }
        prims
    }
}
