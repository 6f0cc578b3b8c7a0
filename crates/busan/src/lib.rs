#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/busan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod workflow;

// Re-export main types from sub-crates
pub use busan_data as data;
pub use busan_factors as factors;
pub use busan_output as output;
pub use busan_premia as premia;

pub use error::{BusanError, Result};
pub use workflow::premia::{PremiaInputs, PremiaRun, PremiaRunConfig};
pub use workflow::update::{UpdateOutcome, update_history};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
