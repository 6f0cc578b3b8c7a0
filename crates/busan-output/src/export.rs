//! Export functionality for factor data.
//!
//! Provides CSV and JSON renderings through the [`Exporter`] trait, and the
//! load/save pair for the two files the engine keeps between runs: the factor
//! file (`date,MKT,SMB,HML,RF`) and the monthly risk-free file (`date,RF`).

use busan_data::ecos::MonthlyRate;
use busan_factors::{FactorHistory, MonthlyFactorRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Pick a format from a file extension: `.json` is pretty JSON, anything
    /// else CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::PrettyJson,
            _ => Self::Csv,
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String>;

    /// Export data to a file in the specified format, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let content = self.export_to_string(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Render flat rows. Nested structures fail in CSV.
pub(crate) fn render_rows<'a, T, I>(rows: I, format: ExportFormat) -> Result<String>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for row in rows {
                wtr.serialize(row)?;
            }
            let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
            String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
        }
        ExportFormat::Json => Ok(serde_json::to_string(&rows.into_iter().collect::<Vec<_>>())?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&rows.into_iter().collect::<Vec<_>>())?),
    }
}

impl<T: Serialize> Exporter for [T] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        render_rows(self, format)
    }
}

impl Exporter for FactorHistory {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        render_rows(self.iter(), format)
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match ExportFormat::from_path(path) {
        ExportFormat::Csv => {
            let mut rdr = csv::Reader::from_path(path)?;
            let rows = rdr.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
            Ok(rows)
        }
        ExportFormat::Json | ExportFormat::PrettyJson => {
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
    }
}

/// Load a factor file.
///
/// A missing file is an empty history, so a first update run starts from
/// nothing. Later rows replace earlier rows for the same month.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_factor_history(path: &Path) -> Result<FactorHistory> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "factor file not found, starting from an empty history");
        return Ok(FactorHistory::new());
    }

    let records: Vec<MonthlyFactorRecord> = read_rows(path)?;
    let rows = records.len();
    let history = FactorHistory::from_records(records);
    if history.len() != rows {
        tracing::warn!(
            path = %path.display(),
            rows,
            months = history.len(),
            "factor file repeats months, keeping the last row of each"
        );
    }

    tracing::info!(path = %path.display(), months = history.len(), "loaded factor history");
    Ok(history)
}

/// Save a factor history, CSV or JSON by file extension.
///
/// # Errors
///
/// Returns an error if serialization or file writing fails.
pub fn save_factor_history(history: &FactorHistory, path: &Path) -> Result<()> {
    history.export_to_file(path, ExportFormat::from_path(path))?;
    tracing::info!(path = %path.display(), months = history.len(), "saved factor history");
    Ok(())
}

/// Load monthly risk-free rates, sorted by date.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_risk_free(path: &Path) -> Result<Vec<MonthlyRate>> {
    let mut rates: Vec<MonthlyRate> = read_rows(path)?;
    rates.sort_by_key(|r| r.date);
    Ok(rates)
}

/// Save monthly risk-free rates, CSV or JSON by file extension.
///
/// # Errors
///
/// Returns an error if serialization or file writing fails.
pub fn save_risk_free(rates: &[MonthlyRate], path: &Path) -> Result<()> {
    rates.export_to_file(path, ExportFormat::from_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn record(y: i32, m: u32, d: u32, mkt: f64) -> MonthlyFactorRecord {
        MonthlyFactorRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            mkt,
            smb: 0.5,
            hml: -0.25,
            rf: 0.0833,
        }
    }

    #[test]
    fn test_history_csv_columns() {
        let history = FactorHistory::from_records([record(2020, 10, 31, 1.5), record(2020, 11, 30, -2.0)]);
        let csv = history.export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("date,MKT,SMB,HML,RF"));
        assert_eq!(lines.next(), Some("2020-10-31,1.5,0.5,-0.25,0.0833"));
        assert_eq!(lines.next(), Some("2020-11-30,-2.0,0.5,-0.25,0.0833"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_history_json() {
        let history = FactorHistory::from_records([record(2020, 10, 31, 1.5)]);
        let json = history.export_to_string(ExportFormat::Json).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"MKT\":1.5"));
        assert!(json.contains("\"date\":\"2020-10-31\""));

        let pretty = history.export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("  "));
    }

    #[rstest]
    #[case("factors.csv", ExportFormat::Csv)]
    #[case("factors.JSON", ExportFormat::PrettyJson)]
    #[case("data/factors.json", ExportFormat::PrettyJson)]
    #[case("factors", ExportFormat::Csv)]
    fn test_export_format_from_path(#[case] path: &str, #[case] expected: ExportFormat) {
        assert_eq!(ExportFormat::from_path(Path::new(path)), expected);
    }

    #[test]
    fn test_extension() {
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn test_missing_factor_file_is_empty() {
        let path = std::env::temp_dir().join("busan_output_missing_factors.csv");
        std::fs::remove_file(&path).ok();
        let history = load_factor_history(&path).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_risk_free_csv_columns() {
        let rates = [MonthlyRate {
            date: NaiveDate::from_ymd_opt(2021, 1, 31).unwrap(),
            rf_percent: 0.0625,
        }];
        let csv = rates.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "date,RF\n2021-01-31,0.0625\n");
    }
}
