//! Error types for factor construction.

use busan_data::DataError;
use thiserror::Error;

/// Result type for factor operations.
pub type Result<T> = std::result::Result<T, FactorError>;

/// Errors that can occur while building factors.
#[derive(Debug, Error)]
pub enum FactorError {
    /// Upstream data retrieval failed
    #[error("Data retrieval failed: {0}")]
    Data(#[from] DataError),

    /// Month range is reversed
    #[error("Invalid month range: {start} is after {end}")]
    InvalidRange {
        /// First month of the range
        start: String,
        /// Last month of the range
        end: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// DataFrame construction failed
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
