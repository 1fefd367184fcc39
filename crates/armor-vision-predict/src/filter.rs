/// Predict / correct capability shared by the linear and extended filters.
///
/// The concrete filter is chosen when a track is created and held by value;
/// this trait exists for generic helpers and tests, not for swapping models at
/// runtime.
pub trait Filter {
    type State;
    type Covariance;
    type Observation: ?Sized;

    /// Propagate the estimate `dt` seconds ahead.
    fn predict(&mut self, dt: f64) -> &Self::State;

    /// Correct with `z`. A failed correction keeps the prior.
    fn update(&mut self, z: &Self::Observation) -> &Self::State;

    fn state(&self) -> &Self::State;

    fn covariance(&self) -> &Self::Covariance;
}
