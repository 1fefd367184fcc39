use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::ekf::{Ekf, EkfParams, Observation};
use crate::filter::Filter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    /// No target.
    #[default]
    Idle,
    /// Corrected on the last tick.
    Tracking,
    /// Coasting on predictions; dropped after `max_lost_ticks`.
    Lost,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    pub ekf: EkfParams,
    /// Ticks without an observation before the target is dropped.
    pub max_lost_ticks: u32,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            ekf: EkfParams::default(),
            max_lost_ticks: 5,
        }
    }
}

/// Single-target tracker driven once per control tick.
#[derive(Clone, Debug, Default)]
pub struct ArmorTracker {
    params: TrackerParams,
    ekf: Option<Ekf>,
    state: TrackState,
    lost_ticks: u32,
}

impl ArmorTracker {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Current estimator, `None` while idle.
    pub fn ekf(&self) -> Option<&Ekf> {
        self.ekf.as_ref()
    }

    pub fn lost_ticks(&self) -> u32 {
        self.lost_ticks
    }

    pub fn reset(&mut self) {
        self.ekf = None;
        self.state = TrackState::Idle;
        self.lost_ticks = 0;
    }

    /// Advance one tick of `dt` seconds. Predicts whenever a target exists
    /// and corrects when `observation` is present.
    pub fn step(&mut self, observation: Option<&Observation>, dt: f64) -> TrackState {
        let Some(ekf) = self.ekf.as_mut() else {
            if let Some(z) = observation {
                debug!("target acquired");
                self.ekf = Some(Ekf::new(self.params.ekf.clone(), z));
                self.state = TrackState::Tracking;
                self.lost_ticks = 0;
            }
            return self.state;
        };

        ekf.predict(dt);
        if let Some(z) = observation {
            ekf.update(z);
            self.state = TrackState::Tracking;
            self.lost_ticks = 0;
        } else {
            self.lost_ticks += 1;
            if self.lost_ticks > self.params.max_lost_ticks {
                info!("target lost after {} ticks", self.lost_ticks);
                self.reset();
            } else {
                self.state = TrackState::Lost;
            }
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ekf::observe;
    use nalgebra::Point3;

    #[test]
    fn lifecycle() {
        let mut tracker = ArmorTracker::new(TrackerParams {
            max_lost_ticks: 2,
            ..Default::default()
        });
        let z = observe(&Point3::new(5.0, 0.0, 0.2));

        assert_eq!(tracker.step(None, 0.01), TrackState::Idle);
        assert_eq!(tracker.step(Some(&z), 0.01), TrackState::Tracking);
        assert_eq!(tracker.step(None, 0.01), TrackState::Lost);
        assert_eq!(tracker.step(Some(&z), 0.01), TrackState::Tracking);
        assert_eq!(tracker.step(None, 0.01), TrackState::Lost);
        assert_eq!(tracker.step(None, 0.01), TrackState::Lost);
        assert_eq!(tracker.step(None, 0.01), TrackState::Idle);
        assert!(tracker.ekf().is_none());
    }

    #[test]
    fn follows_moving_target() {
        let mut tracker = ArmorTracker::new(TrackerParams::default());
        let dt = 0.01;
        for i in 0..300 {
            let t = i as f64 * dt;
            let z = observe(&Point3::new(5.0, -1.0 + 0.8 * t, 0.3));
            tracker.step(Some(&z), dt);
        }
        let ekf = tracker.ekf().unwrap();
        assert!((ekf.velocity().y - 0.8).abs() < 0.15);
        assert!(ekf.velocity().x.abs() < 0.15);
    }
}
