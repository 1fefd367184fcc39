//! Backend-agnostic overlay primitives.
//!
//! Detectors describe what to draw; a renderer elsewhere rasterizes it.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DrawPrimitive {
    Line {
        from: Point2<f32>,
        to: Point2<f32>,
        color: Color,
    },
    /// Closed outline through `points`.
    Polygon {
        points: Vec<Point2<f32>>,
        color: Color,
    },
    Circle {
        center: Point2<f32>,
        radius: f32,
        color: Color,
        filled: bool,
    },
    Text {
        origin: Point2<f32>,
        text: String,
        scale: f32,
        color: Color,
    },
}

/// Frame-level caption in the top-left corner.
pub fn label(text: impl Into<String>) -> DrawPrimitive {
    DrawPrimitive::Text {
        origin: Point2::new(10.0, 10.0),
        text: text.into(),
        scale: 20.0,
        color: Color::GREEN,
    }
}
