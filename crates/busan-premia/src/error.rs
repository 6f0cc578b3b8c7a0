//! Error types for premium estimation.

use thiserror::Error;

/// Result type for premium estimation.
pub type Result<T> = std::result::Result<T, PremiaError>;

/// Errors that can occur while estimating factor premia.
#[derive(Debug, Error)]
pub enum PremiaError {
    /// Not enough observations for an estimation step
    #[error("Insufficient data for {stage}: need {required}, have {actual}")]
    InsufficientData {
        /// Estimation step that ran short
        stage: &'static str,
        /// Required number of observations
        required: usize,
        /// Available number of observations
        actual: usize,
    },

    /// Dimension mismatch between inputs
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Normal equations could not be solved
    #[error("Matrix is singular or nearly singular")]
    SingularMatrix,

    /// Empty input
    #[error("Empty data")]
    EmptyData,

    /// Distribution construction failed
    #[error("Distribution error: {0}")]
    Distribution(String),
}
