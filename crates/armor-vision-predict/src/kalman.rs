//! Linear Kalman filter with runtime dimensions.

use log::warn;
use nalgebra::{DMatrix, DVector};

use crate::error::FilterError;
use crate::filter::Filter;

#[derive(Debug, Clone)]
pub struct KalmanFilterParams {
    /// Initial state.
    pub x: DVector<f64>,
    /// Initial state covariance.
    pub p: DMatrix<f64>,
    /// State transition for one step.
    pub f: DMatrix<f64>,
    /// Observation matrix.
    pub h: DMatrix<f64>,
    /// Process noise covariance.
    pub q: DMatrix<f64>,
    /// Observation noise covariance.
    pub r: DMatrix<f64>,
    /// Optional control matrix, `dim_x` rows.
    pub b: Option<DMatrix<f64>>,
}

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    x: DVector<f64>,
    p: DMatrix<f64>,
    f: DMatrix<f64>,
    h: DMatrix<f64>,
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    b: Option<DMatrix<f64>>,
}

fn check_dim(what: &'static str, expected: usize, actual: usize) -> Result<(), FilterError> {
    if expected != actual {
        return Err(FilterError::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

impl KalmanFilter {
    pub fn new(params: KalmanFilterParams) -> Result<Self, FilterError> {
        let n = params.x.len();
        let m = params.h.nrows();
        check_dim("P rows", n, params.p.nrows())?;
        check_dim("P cols", n, params.p.ncols())?;
        check_dim("F rows", n, params.f.nrows())?;
        check_dim("F cols", n, params.f.ncols())?;
        check_dim("Q rows", n, params.q.nrows())?;
        check_dim("Q cols", n, params.q.ncols())?;
        check_dim("H cols", n, params.h.ncols())?;
        check_dim("R rows", m, params.r.nrows())?;
        check_dim("R cols", m, params.r.ncols())?;
        if let Some(b) = &params.b {
            check_dim("B rows", n, b.nrows())?;
        }

        Ok(Self {
            x: params.x,
            p: params.p,
            f: params.f,
            h: params.h,
            q: params.q,
            r: params.r,
            b: params.b,
        })
    }

    pub fn dim_x(&self) -> usize {
        self.x.len()
    }

    pub fn dim_z(&self) -> usize {
        self.h.nrows()
    }

    /// `x = F x + B u`, `P = F P Fᵀ + Q`.
    pub fn predict_with_control(&mut self, u: &DVector<f64>) -> Result<&DVector<f64>, FilterError> {
        let Some(b) = &self.b else {
            return Err(FilterError::DimensionMismatch {
                what: "control input (no B)",
                expected: 0,
                actual: u.len(),
            });
        };
        check_dim("control input", b.ncols(), u.len())?;
        self.x = &self.f * &self.x + b * u;
        self.p = &self.f * &self.p * self.f.transpose() + &self.q;
        Ok(&self.x)
    }

    /// Correct with `z`, leaving the prior intact on failure.
    pub fn try_update(&mut self, z: &DVector<f64>) -> Result<(), FilterError> {
        check_dim("observation", self.dim_z(), z.len())?;

        let y = z - &self.h * &self.x;
        let s = &self.h * &self.p * self.h.transpose() + &self.r;
        let s_inv = s.try_inverse().ok_or(FilterError::SingularInnovation)?;
        let k = &self.p * self.h.transpose() * s_inv;

        let x = &self.x + &k * y;
        let ikh = DMatrix::identity(self.dim_x(), self.dim_x()) - &k * &self.h;
        let p = &ikh * &self.p * ikh.transpose() + &k * &self.r * k.transpose();
        let p = (&p + p.transpose()) * 0.5;

        if x.iter().chain(p.iter()).any(|v| !v.is_finite()) {
            return Err(FilterError::NonFinite);
        }
        self.x = x;
        self.p = p;
        Ok(())
    }
}

impl Filter for KalmanFilter {
    type State = DVector<f64>;
    type Covariance = DMatrix<f64>;
    type Observation = DVector<f64>;

    /// `F` is fixed at construction and already encodes the step length,
    /// so `dt` is not used.
    fn predict(&mut self, _dt: f64) -> &DVector<f64> {
        self.x = &self.f * &self.x;
        self.p = &self.f * &self.p * self.f.transpose() + &self.q;
        &self.x
    }

    fn update(&mut self, z: &DVector<f64>) -> &DVector<f64> {
        if let Err(err) = self.try_update(z) {
            warn!("kalman correction skipped: {err}");
        }
        &self.x
    }

    fn state(&self) -> &DVector<f64> {
        &self.x
    }

    fn covariance(&self) -> &DMatrix<f64> {
        &self.p
    }
}
