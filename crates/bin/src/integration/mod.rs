//! Glue between the command line and the library crates.
//!
//! Store location handling and terminal progress reporting for factor runs.

pub(crate) mod progress;
pub(crate) mod store_manager;
