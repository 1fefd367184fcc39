//! Rasterizes [`DrawPrimitive`]s onto a caller-owned RGB image.

use ab_glyph::{FontArc, PxScale};
use armor_vision_core::{Armor, Color, DrawPrimitive, FrameView};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut,
};
use nalgebra::Point2;
use rayon::prelude::*;

/// Drawing surface for detector overlays.
///
/// Text primitives need a font; without one they are skipped.
pub struct Canvas<'a> {
    image: &'a mut RgbImage,
    font: Option<&'a FontArc>,
}

impl<'a> Canvas<'a> {
    pub fn new(image: &'a mut RgbImage) -> Self {
        Self { image, font: None }
    }

    pub fn with_font(mut self, font: &'a FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn image(&self) -> &RgbImage {
        &*self.image
    }

    pub fn draw(&mut self, primitive: &DrawPrimitive) {
        match primitive {
            DrawPrimitive::Line { from, to, color } => self.line(*from, *to, *color),
            DrawPrimitive::Polygon { points, color } => {
                for (i, from) in points.iter().enumerate() {
                    let to = points[(i + 1) % points.len()];
                    self.line(*from, to, *color);
                }
            }
            DrawPrimitive::Circle {
                center,
                radius,
                color,
                filled,
            } => {
                let c = (center.x.round() as i32, center.y.round() as i32);
                let r = radius.round().max(1.0) as i32;
                if *filled {
                    draw_filled_circle_mut(&mut *self.image, c, r, rgb(*color));
                } else {
                    draw_hollow_circle_mut(&mut *self.image, c, r, rgb(*color));
                }
            }
            DrawPrimitive::Text {
                origin,
                text,
                scale,
                color,
            } => {
                if let Some(font) = self.font {
                    draw_text_mut(
                        &mut *self.image,
                        rgb(*color),
                        origin.x.round() as i32,
                        origin.y.round() as i32,
                        PxScale::from(*scale),
                        font,
                        text,
                    );
                }
            }
        }
    }

    pub fn draw_all(&mut self, primitives: &[DrawPrimitive]) {
        for p in primitives {
            self.draw(p);
        }
    }

    fn line(&mut self, from: Point2<f32>, to: Point2<f32>, color: Color) {
        draw_line_segment_mut(&mut *self.image, (from.x, from.y), (to.x, to.y), rgb(color));
    }
}

fn rgb(c: Color) -> Rgb<u8> {
    Rgb([c.r, c.g, c.b])
}

/// Overlay primitives of every armor, computed in parallel and merged in
/// input order.
pub fn armor_primitives(armors: &[Armor], add_label: bool) -> Vec<DrawPrimitive> {
    armors
        .par_iter()
        .flat_map_iter(|armor| armor.visualize_object(add_label))
        .collect()
}

/// Borrow an `RgbImage` as a detector frame.
pub fn frame_view(image: &RgbImage) -> FrameView<'_> {
    FrameView {
        width: image.width() as usize,
        height: image.height() as usize,
        data: image.as_raw(),
    }
}

/// Copy a frame into an `RgbImage`; `None` if its buffer is inconsistent.
pub fn frame_to_image(frame: &FrameView) -> Option<RgbImage> {
    if !frame.is_valid() {
        return None;
    }
    RgbImage::from_raw(frame.width as u32, frame.height as u32, frame.data.to_vec())
}
