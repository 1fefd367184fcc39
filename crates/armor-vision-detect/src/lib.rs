//! Per-frame detectors built on top of `armor-vision-core`.
//!
//! Every detector implements [`Detector`]: `detect` consumes a borrowed RGB
//! frame and replaces the previous results, `visualize_result` draws them on
//! a [`Canvas`] according to a verbosity level.
//!
//! - [`SnipeDetector`]: enemy light bars paired into outpost armor plates.
//! - [`GuidingLightDetector`]: dark circular blobs on a grayscale frame.
//! - [`BuffDetector`]: the rotating power rune, hub plus plates.
//! - [`OreCubeDetector`]: gold and silver ore cube faces.
//!
//! `armor_vision_nn::NeuralDetector` also implements [`Detector`] so neural
//! and classical pipelines share one overlay path.
//!
//! ```no_run
//! use armor_vision_core::Team;
//! use armor_vision_detect::{frame_view, Canvas, Detector, SnipeDetector, SnipeParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut img = image::open("outpost.png")?.to_rgb8();
//! let mut detector = SnipeDetector::new(SnipeParams::default(), Team::Blue);
//! let armors = detector.detect(&frame_view(&img)).to_vec();
//! println!("{} armors", armors.len());
//! detector.visualize_result(&mut Canvas::new(&mut img), 2);
//! # Ok(())
//! # }
//! ```

mod blob;
mod buff;
mod contour;
mod detector;
mod guiding_light;
mod light;
mod mask;
mod ore_cube;
mod pairing;
mod render;
mod snipe;

pub use blob::{BlobParams, KeyPoint, SimpleBlobDetector};
pub use buff::{Buff, BuffArmor, BuffDetector, BuffParams};
pub use contour::{min_area_rotated_rect, outer_contours, polygon_moments, Moments};
pub use detector::Detector;
pub use guiding_light::{GuidingLight, GuidingLightDetector};
pub use light::{extract_light_bars, LightParams};
pub use mask::{binarize, color_mask, team_mask, to_gray};
pub use ore_cube::{OreCube, OreCubeDetector, OreCubeParams, OreKind};
pub use pairing::{find_armors, PairingParams};
pub use render::{armor_primitives, frame_to_image, frame_view, Canvas};
pub use snipe::{SnipeDetector, SnipeParams};
