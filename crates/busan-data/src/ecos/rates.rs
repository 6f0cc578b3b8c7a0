//! Daily and monthly risk-free rates.

use crate::calendar::YearMonth;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One daily yield observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRate {
    /// Observation date
    pub date: NaiveDate,
    /// Annualized yield in percent
    pub annual_percent: f64,
}

/// Monthly risk-free rate, keyed by month end.
///
/// Serialized as `date,RF` with the rate in monthly percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRate {
    /// Last calendar day of the month
    pub date: NaiveDate,
    /// Monthly rate in percent
    #[serde(rename = "RF")]
    pub rf_percent: f64,
}

impl MonthlyRate {
    /// The month this rate belongs to.
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }

    /// Monthly rate as a decimal fraction.
    pub fn as_decimal(&self) -> f64 {
        self.rf_percent / 100.0
    }
}

/// Aggregate daily annual yields to monthly rates.
///
/// Each month's rate is the simple mean of its daily annual yields divided by
/// 12. Output is sorted by month; non-finite observations are ignored.
pub fn monthly_risk_free(daily: &[DailyRate]) -> Vec<MonthlyRate> {
    let mut sums: BTreeMap<YearMonth, (f64, usize)> = BTreeMap::new();
    for rate in daily.iter().filter(|r| r.annual_percent.is_finite()) {
        let entry = sums.entry(YearMonth::from_date(rate.date)).or_insert((0.0, 0));
        entry.0 += rate.annual_percent;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(month, (sum, count))| MonthlyRate {
            date: month.last_day(),
            rf_percent: sum / count as f64 / 12.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn daily(y: i32, m: u32, d: u32, rate: f64) -> DailyRate {
        DailyRate {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            annual_percent: rate,
        }
    }

    #[test]
    fn test_monthly_mean_over_twelve() {
        let rates = vec![
            daily(2020, 11, 2, 0.70),
            daily(2020, 10, 5, 0.60),
            daily(2020, 10, 6, 0.66),
            daily(2020, 11, 3, f64::NAN),
        ];

        let monthly = monthly_risk_free(&rates);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].date, NaiveDate::from_ymd_opt(2020, 10, 31).unwrap());
        assert_relative_eq!(monthly[0].rf_percent, 0.63 / 12.0, epsilon = 1e-12);
        assert_eq!(monthly[1].date, NaiveDate::from_ymd_opt(2020, 11, 30).unwrap());
        assert_relative_eq!(monthly[1].rf_percent, 0.70 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(monthly[1].as_decimal(), 0.007 / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert!(monthly_risk_free(&[]).is_empty());
    }
}
