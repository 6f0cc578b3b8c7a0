#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/busan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod fama_macbeth;
pub mod ols;
pub mod panel;
pub mod stats;

pub use error::{PremiaError, Result};
pub use fama_macbeth::{
    FactorPremium, FamaMacBeth, FamaMacBethConfig, FamaMacBethResult, PeriodGamma, PricedFactor,
    ReturnSeries, SecurityBeta,
};
pub use ols::{OlsFit, ols, with_intercept};
pub use panel::{DailyFactorPanel, DailyFactors, TRADING_DAYS_PER_MONTH};
pub use stats::{Describe, Significance, TTest, correlation};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
