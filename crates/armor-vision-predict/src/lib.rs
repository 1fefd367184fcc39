//! State estimation for tracked targets.
//!
//! - [`KalmanFilter`]: linear filter with dynamic dimensions and an optional
//!   control input.
//! - [`Ekf`]: extended filter over `[x, vx, y, vy, z]` observed as
//!   `[yaw, pitch, distance]`.
//! - [`ArmorTracker`]: owns one [`Ekf`] and walks it through the
//!   idle / tracking / lost cycle.
//!
//! Both filters fail closed: an update whose innovation covariance cannot be
//! inverted, or whose result is not finite, leaves the prior untouched.

mod ekf;
mod error;
mod filter;
mod kalman;
mod tracker;

pub use ekf::{
    observe, wrap_angle, Ekf, EkfCovariance, EkfParams, EkfState, Observation, OBS_DIM, STATE_DIM,
};
pub use error::FilterError;
pub use filter::Filter;
pub use kalman::{KalmanFilter, KalmanFilterParams};
pub use tracker::{ArmorTracker, TrackState, TrackerParams};
