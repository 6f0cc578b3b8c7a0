//! Run reports.

use busan_data::YearMonth;
use busan_factors::RunStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one factor computation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Command that produced the run.
    pub command: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// First requested month.
    pub start: Option<YearMonth>,

    /// Last requested month.
    pub end: Option<YearMonth>,

    /// Month counts collected during the run.
    pub stats: RunStats,

    /// Months in the saved history.
    pub history_months: usize,

    /// Where the history was written.
    pub output: Option<PathBuf>,
}

impl RunReport {
    /// Whether any month was computed.
    pub const fn succeeded(&self) -> bool {
        self.stats.computed > 0
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct RunReportBuilder {
    command: Option<String>,
    start: Option<YearMonth>,
    end: Option<YearMonth>,
    stats: Option<RunStats>,
    history_months: usize,
    output: Option<PathBuf>,
}

impl RunReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the command name.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the requested range.
    pub const fn range(mut self, start: YearMonth, end: YearMonth) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Set the run statistics.
    pub fn stats(mut self, stats: RunStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Set the size of the saved history.
    pub const fn history_months(mut self, months: usize) -> Self {
        self.history_months = months;
        self
    }

    /// Set the output path.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Build the report.
    pub fn build(self) -> RunReport {
        RunReport {
            command: self.command.unwrap_or_default(),
            timestamp: Utc::now(),
            start: self.start,
            end: self.end,
            stats: self.stats.unwrap_or_default(),
            history_months: self.history_months,
            output: self.output,
        }
    }
}
