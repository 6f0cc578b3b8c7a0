//! Monthly factor records and the ordered factor history.

use crate::error::Result;
use busan_data::YearMonth;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Factor returns for one holding month, in percent.
///
/// Field names serialize as the `date, MKT, SMB, HML, RF` columns of the
/// factor file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFactorRecord {
    /// Last calendar day of the holding month
    pub date: NaiveDate,
    /// Market return minus risk-free rate
    #[serde(rename = "MKT")]
    pub mkt: f64,
    /// Small minus big
    #[serde(rename = "SMB")]
    pub smb: f64,
    /// High minus low book-to-market
    #[serde(rename = "HML")]
    pub hml: f64,
    /// Risk-free rate
    #[serde(rename = "RF")]
    pub rf: f64,
}

impl MonthlyFactorRecord {
    /// Holding month of the record.
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Counts from a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Months not present before
    pub added: usize,
    /// Months whose record was replaced
    pub replaced: usize,
}

/// Factor records ordered by month, at most one per month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorHistory {
    records: BTreeMap<YearMonth, MonthlyFactorRecord>,
}

impl FactorHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records in any order. A later record for the same month
    /// replaces an earlier one.
    pub fn from_records(records: impl IntoIterator<Item = MonthlyFactorRecord>) -> Self {
        let mut history = Self::new();
        for record in records {
            history.insert(record);
        }
        history
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, record: MonthlyFactorRecord) -> Option<MonthlyFactorRecord> {
        self.records.insert(record.month(), record)
    }

    /// Record of one month.
    pub fn get(&self, month: YearMonth) -> Option<&MonthlyFactorRecord> {
        self.records.get(&month)
    }

    /// Whether `month` has a record.
    pub fn contains(&self, month: YearMonth) -> bool {
        self.records.contains_key(&month)
    }

    /// Number of months.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the history has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in increasing date order.
    pub fn iter(&self) -> btree_map::Values<'_, YearMonth, MonthlyFactorRecord> {
        self.records.values()
    }

    /// First month with a record.
    pub fn first_month(&self) -> Option<YearMonth> {
        self.records.keys().next().copied()
    }

    /// Last month with a record.
    pub fn last_month(&self) -> Option<YearMonth> {
        self.records.keys().next_back().copied()
    }

    /// Months from `start` to `end` inclusive that have no record, in order.
    pub fn missing_months(&self, start: YearMonth, end: YearMonth) -> Vec<YearMonth> {
        YearMonth::range_inclusive(start, end)
            .filter(|m| !self.contains(*m))
            .collect()
    }

    /// Merge `other` into this history. Records from `other` win on
    /// conflicting months.
    pub fn merge(&mut self, other: Self) -> MergeStats {
        let mut stats = MergeStats::default();
        for record in other.records.into_values() {
            match self.insert(record) {
                Some(_) => stats.replaced += 1,
                None => stats.added += 1,
            }
        }
        stats
    }

    /// One column of values in date order.
    pub fn column(&self, select: impl Fn(&MonthlyFactorRecord) -> f64) -> Vec<f64> {
        self.iter().map(select).collect()
    }

    /// Convert to a DataFrame with columns `date, MKT, SMB, HML, RF`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        let dates: Vec<i32> = self
            .iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect();

        let df = DataFrame::new(vec![
            Series::new("date".into(), dates).into(),
            Series::new("MKT".into(), self.column(|r| r.mkt)).into(),
            Series::new("SMB".into(), self.column(|r| r.smb)).into(),
            Series::new("HML".into(), self.column(|r| r.hml)).into(),
            Series::new("RF".into(), self.column(|r| r.rf)).into(),
        ])?;

        let df = df
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()?;

        Ok(df)
    }
}

impl<'a> IntoIterator for &'a FactorHistory {
    type Item = &'a MonthlyFactorRecord;
    type IntoIter = btree_map::Values<'a, YearMonth, MonthlyFactorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<MonthlyFactorRecord> for FactorHistory {
    fn from_iter<T: IntoIterator<Item = MonthlyFactorRecord>>(iter: T) -> Self {
        Self::from_records(iter)
    }
}
