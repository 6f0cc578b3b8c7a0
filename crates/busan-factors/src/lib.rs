#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/busan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod error;
pub mod history;
pub mod observer;
pub mod portfolio;
pub mod returns;
pub mod risk_free;
pub mod synthesizer;

pub use aggregate::{Aggregate, value_weighted};
pub use error::{FactorError, Result};
pub use history::{FactorHistory, MergeStats, MonthlyFactorRecord};
pub use observer::{NullObserver, RunObserver, RunStats, TracingObserver};
pub use portfolio::{
    Breakpoints, PortfolioConfig, PortfolioFormer, PortfolioLabel, Portfolios, SizeBucket,
    ValueBucket,
};
pub use returns::{HoldingReturn, daily_returns, holding_returns, monthly_return_series};
pub use risk_free::RiskFreeSchedule;
pub use synthesizer::{
    FactorSynthesizer, MonthOutcome, MonthSchedule, PortfolioReturns, SkipReason,
    SynthesizerConfig,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
