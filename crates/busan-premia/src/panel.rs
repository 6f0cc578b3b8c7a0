//! Daily factor panel built from monthly factor records.

use busan_data::YearMonth;
use busan_factors::FactorHistory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Approximate trading days per month used to spread monthly returns.
pub const TRADING_DAYS_PER_MONTH: f64 = 21.0;

/// Factor returns for one trading day, as decimal fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyFactors {
    /// Market excess return
    pub mkt: f64,
    /// Size factor
    pub smb: f64,
    /// Value factor
    pub hml: f64,
    /// Risk-free rate
    pub rf: f64,
}

impl DailyFactors {
    /// Regressor values in `[MKT, SMB, HML]` order.
    pub const fn regressors(&self) -> [f64; 3] {
        [self.mkt, self.smb, self.hml]
    }
}

/// Factor returns keyed by trading day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyFactorPanel {
    rows: BTreeMap<NaiveDate, DailyFactors>,
}

impl DailyFactorPanel {
    /// Assign each trading day the factor record of its month, converted from
    /// monthly percent to an approximate daily fraction (`value / 100 / 21`).
    ///
    /// Days whose month has no record are left out.
    pub fn from_monthly(history: &FactorHistory, trading_days: impl IntoIterator<Item = NaiveDate>) -> Self {
        let scale = 100.0 * TRADING_DAYS_PER_MONTH;
        let rows = trading_days
            .into_iter()
            .filter_map(|day| {
                let record = history.get(YearMonth::from_date(day))?;
                Some((
                    day,
                    DailyFactors {
                        mkt: record.mkt / scale,
                        smb: record.smb / scale,
                        hml: record.hml / scale,
                        rf: record.rf / scale,
                    },
                ))
            })
            .collect();
        Self { rows }
    }

    /// Build from explicit rows.
    pub fn from_rows(rows: impl IntoIterator<Item = (NaiveDate, DailyFactors)>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    /// Factors on `date`.
    pub fn get(&self, date: NaiveDate) -> Option<&DailyFactors> {
        self.rows.get(&date)
    }

    /// Number of days.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the panel has no days.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Days and factors in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DailyFactors)> + '_ {
        self.rows.iter().map(|(d, f)| (*d, f))
    }
}
