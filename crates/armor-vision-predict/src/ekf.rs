//! Extended Kalman filter for a target observed from the gimbal.
//!
//! State `[x, vx, y, vy, z]` in the gimbal frame (metres, m/s): constant
//! velocity in the horizontal plane, constant height. Observation
//! `[yaw, pitch, distance]` with
//!
//! ```text
//! yaw      = atan2(y, x)
//! pitch    = atan2(z, hypot(x, y))
//! distance = |(x, y, z)|
//! ```
//!
//! Angular innovations are wrapped to `(-pi, pi]`. Covariance correction
//! uses the Joseph form and is re-symmetrized after every step.

use std::f64::consts::{PI, TAU};

use log::{trace, warn};
use nalgebra::{Matrix3, Point3, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::filter::Filter;

#[cfg(feature = "tracing")]
use tracing::instrument;

pub const STATE_DIM: usize = 5;
pub const OBS_DIM: usize = 3;

pub type EkfState = SVector<f64, STATE_DIM>;
pub type EkfCovariance = SMatrix<f64, STATE_DIM, STATE_DIM>;
/// `[yaw, pitch, distance]`, radians and metres.
pub type Observation = Vector3<f64>;

type Jacobian = SMatrix<f64, OBS_DIM, STATE_DIM>;
type Gain = SMatrix<f64, STATE_DIM, OBS_DIM>;

const IX: usize = 0;
const IVX: usize = 1;
const IY: usize = 2;
const IVY: usize = 3;
const IZ: usize = 4;

/// Horizontal range below which the measurement Jacobian is undefined.
const MIN_RANGE: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EkfParams {
    /// Initial variance of x, y and z.
    pub initial_position_variance: f64,
    /// Initial variance of vx and vy.
    pub initial_velocity_variance: f64,
    /// Process noise added to x and y per prediction.
    pub process_position_noise: f64,
    /// Process noise added to vx and vy per prediction.
    pub process_velocity_noise: f64,
    /// Process noise added to z per prediction.
    pub process_height_noise: f64,
    pub yaw_noise: f64,
    pub pitch_noise: f64,
    pub distance_noise: f64,
    /// Upper bound on `trace(P)`; larger covariances are scaled down.
    pub max_covariance_trace: f64,
}

impl Default for EkfParams {
    fn default() -> Self {
        Self {
            initial_position_variance: 1.0,
            initial_velocity_variance: 16.0,
            process_position_noise: 1e-3,
            process_velocity_noise: 1e-2,
            process_height_noise: 1e-3,
            yaw_noise: 1e-3,
            pitch_noise: 1e-3,
            distance_noise: 5e-2,
            max_covariance_trace: 1e6,
        }
    }
}

impl EkfParams {
    fn initial_covariance(&self) -> EkfCovariance {
        let p = self.initial_position_variance;
        let v = self.initial_velocity_variance;
        EkfCovariance::from_diagonal(&EkfState::from([p, v, p, v, p]))
    }

    fn process_noise(&self) -> EkfCovariance {
        let p = self.process_position_noise;
        let v = self.process_velocity_noise;
        EkfCovariance::from_diagonal(&EkfState::from([p, v, p, v, self.process_height_noise]))
    }

    fn measurement_noise(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::new(
            self.yaw_noise,
            self.pitch_noise,
            self.distance_noise,
        ))
    }
}

/// Wrap an angle to `(-pi, pi]`.
pub fn wrap_angle(a: f64) -> f64 {
    let w = (a + PI).rem_euclid(TAU) - PI;
    if w <= -PI {
        w + TAU
    } else {
        w
    }
}

/// Measurement model applied to a position.
pub fn observe(p: &Point3<f64>) -> Observation {
    let rho = p.x.hypot(p.y);
    Observation::new(p.y.atan2(p.x), p.z.atan2(rho), p.coords.norm())
}

fn measure(x: &EkfState) -> Observation {
    observe(&Point3::new(x[IX], x[IY], x[IZ]))
}

fn measurement_jacobian(x: &EkfState) -> Result<Jacobian, FilterError> {
    let (px, py, pz) = (x[IX], x[IY], x[IZ]);
    let r2 = px * px + py * py;
    let rho = r2.sqrt();
    if rho < MIN_RANGE {
        return Err(FilterError::NonFinite);
    }
    let d2 = r2 + pz * pz;
    let d = d2.sqrt();

    let mut h = Jacobian::zeros();
    h[(0, IX)] = -py / r2;
    h[(0, IY)] = px / r2;
    h[(1, IX)] = -pz * px / (rho * d2);
    h[(1, IY)] = -pz * py / (rho * d2);
    h[(1, IZ)] = rho / d2;
    h[(2, IX)] = px / d;
    h[(2, IY)] = py / d;
    h[(2, IZ)] = pz / d;
    Ok(h)
}

fn transition(dt: f64) -> EkfCovariance {
    let mut f = EkfCovariance::identity();
    f[(IX, IVX)] = dt;
    f[(IY, IVY)] = dt;
    f
}

fn propagate(x: &EkfState, dt: f64) -> EkfState {
    let mut next = *x;
    next[IX] += x[IVX] * dt;
    next[IY] += x[IVY] * dt;
    next
}

#[derive(Clone, Debug)]
pub struct Ekf {
    params: EkfParams,
    x: EkfState,
    p: EkfCovariance,
    q: EkfCovariance,
    r: Matrix3<f64>,
}

impl Ekf {
    /// Start a track from its first observation: position from the inverted
    /// measurement model, zero velocity.
    pub fn new(params: EkfParams, z: &Observation) -> Self {
        let (yaw, pitch, distance) = (z[0], z[1], z[2]);
        let rho = distance * pitch.cos();
        let x = EkfState::from([
            rho * yaw.cos(),
            0.0,
            rho * yaw.sin(),
            0.0,
            distance * pitch.sin(),
        ]);
        Self {
            p: params.initial_covariance(),
            q: params.process_noise(),
            r: params.measurement_noise(),
            params,
            x,
        }
    }

    pub fn params(&self) -> &EkfParams {
        &self.params
    }

    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x[IX], self.x[IY], self.x[IZ])
    }

    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::new(self.x[IVX], self.x[IVY], 0.0)
    }

    /// Observation expected at the current state.
    pub fn expected_observation(&self) -> Observation {
        measure(&self.x)
    }

    /// Observation expected `lead_time` seconds ahead, without touching the
    /// estimate. Used to aim at where the target will be.
    pub fn predicted_observation(&self, lead_time: f64) -> Observation {
        measure(&propagate(&self.x, lead_time))
    }

    /// Correct with `z`; on error the prior is kept.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn try_update(&mut self, z: &Observation) -> Result<(), FilterError> {
        let h = measurement_jacobian(&self.x)?;

        let mut innovation = z - measure(&self.x);
        innovation[0] = wrap_angle(innovation[0]);
        innovation[1] = wrap_angle(innovation[1]);

        let s = h * self.p * h.transpose() + self.r;
        let s_inv = s.try_inverse().ok_or(FilterError::SingularInnovation)?;
        let k: Gain = self.p * h.transpose() * s_inv;

        let x = self.x + k * innovation;
        let ikh = EkfCovariance::identity() - k * h;
        let p = ikh * self.p * ikh.transpose() + k * self.r * k.transpose();

        if x.iter().chain(p.iter()).any(|v| !v.is_finite()) {
            return Err(FilterError::NonFinite);
        }
        self.x = x;
        self.p = symmetrize(&p);
        trace!("ekf innovation {:?}", innovation.as_slice());
        Ok(())
    }

    fn cap_covariance(&mut self) {
        let trace = self.p.trace();
        let cap = self.params.max_covariance_trace;
        if trace > cap && cap > 0.0 {
            self.p *= cap / trace;
        }
    }
}

fn symmetrize(p: &EkfCovariance) -> EkfCovariance {
    (p + p.transpose()) * 0.5
}

impl Filter for Ekf {
    type State = EkfState;
    type Covariance = EkfCovariance;
    type Observation = Observation;

    fn predict(&mut self, dt: f64) -> &EkfState {
        let f = transition(dt);
        self.x = propagate(&self.x, dt);
        self.p = symmetrize(&(f * self.p * f.transpose() + self.q));
        self.cap_covariance();
        &self.x
    }

    fn update(&mut self, z: &Observation) -> &EkfState {
        if let Err(err) = self.try_update(z) {
            warn!("ekf correction skipped: {err}");
        }
        &self.x
    }

    fn state(&self) -> &EkfState {
        &self.x
    }

    fn covariance(&self) -> &EkfCovariance {
        &self.p
    }
}
