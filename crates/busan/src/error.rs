//! Errors from workflows that span several crates.

use thiserror::Error;

/// Result type for workflows.
pub type Result<T> = std::result::Result<T, BusanError>;

/// Errors raised by a workflow step.
#[derive(Debug, Error)]
pub enum BusanError {
    /// Store or upstream retrieval failed
    #[error(transparent)]
    Data(#[from] busan_data::DataError),

    /// Factor construction failed
    #[error(transparent)]
    Factor(#[from] busan_factors::FactorError),

    /// Premium estimation failed
    #[error(transparent)]
    Premia(#[from] busan_premia::PremiaError),

    /// Reading or writing a file failed
    #[error(transparent)]
    Export(#[from] busan_output::ExportError),

    /// Writing the run report failed
    #[error(transparent)]
    Report(#[from] busan_output::ReportError),

    /// Invalid workflow input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        busan_factors::FactorError::InvalidRange { start: "2021-03".into(), end: "2021-01".into() }.into(),
        "Invalid month range: 2021-03 is after 2021-01"
    )]
    #[case(
        busan_premia::PremiaError::InsufficientData { stage: "stage two periods", required: 2, actual: 1 }.into(),
        "Insufficient data for stage two periods: need 2, have 1"
    )]
    #[case(BusanError::InvalidInput("no priced instruments".into()), "Invalid input: no priced instruments")]
    fn test_messages_pass_through(#[case] error: BusanError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
