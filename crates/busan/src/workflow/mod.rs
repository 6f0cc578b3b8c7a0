//! Workflows spanning data retrieval, factor construction and estimation.

pub mod premia;
pub mod update;
