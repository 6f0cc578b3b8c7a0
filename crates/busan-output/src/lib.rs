#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/busan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod premia;
pub mod report;
pub mod summary;

pub use export::{
    ExportError, ExportFormat, Exporter, load_factor_history, load_risk_free, save_factor_history,
    save_risk_free,
};
pub use premia::{BetaRow, PremiaArtifacts, render_premia_summary, write_premia};
pub use report::{ReportError, RunReport, RunReportBuilder};
pub use summary::{FactorStatistics, FactorSummary};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
