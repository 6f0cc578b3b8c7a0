#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/busan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod ecos;
pub mod error;
pub mod gateway;
pub mod model;
pub mod store;

pub use calendar::YearMonth;
pub use error::{DataError, Result};
pub use gateway::{DEFAULT_MARKET, SecurityDataGateway};
pub use model::{DailyQuote, FundamentalRecord, SecurityId, SecurityObservation};
pub use store::{SecurityStore, SqliteStore, StoreStats};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
