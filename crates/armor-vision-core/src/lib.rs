//! Core types for the armor perception pipeline.
//!
//! This crate is purely geometric and has no image-library dependency.
//! Light bars arrive as oriented rectangles and overlays leave as plain
//! [`DrawPrimitive`] values.

mod armor;
mod draw;
mod game;
mod geometry;
mod image;
mod light_bar;
mod logger;
mod timing;

pub use armor::{pair, Armor, ArmorError};
pub use draw::{label, Color, DrawPrimitive};
pub use game::{Model, ParseTeamError, Team};
pub use geometry::{point_in_polygon, RotatedRect, GEOMETRY_EPSILON};
pub use image::{Frame, FrameView, FRAME_CHANNELS};
pub use light_bar::LightBar;
pub use timing::{ScopedTimer, StageTimer};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{filter_directives, init_with_level, log_builder};
