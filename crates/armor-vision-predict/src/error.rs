#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("innovation covariance is singular")]
    SingularInnovation,
    #[error("update produced non-finite values")]
    NonFinite,
    #[error("{what} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}
