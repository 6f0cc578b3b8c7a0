//! Holding-period returns from daily price records.
//!
//! Daily records are reduced to one snapshot per instrument and month (the
//! last priced day), and a month's return is measured only against the
//! snapshot of the immediately preceding month. An instrument without a prior
//! month snapshot has no return, never a zero return.

use busan_data::{DailyQuote, SecurityId, YearMonth};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Last priced record of an instrument within a month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthEndSnapshot {
    /// Date of the snapshot
    pub date: NaiveDate,
    /// Split-adjusted price
    pub adjusted_price: f64,
    /// Market capitalization on the snapshot date
    pub market_cap: Option<f64>,
}

/// Realized return of one instrument over a holding month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldingReturn {
    /// Simple return as a decimal fraction
    pub ret: f64,
    /// Market capitalization at the end of the holding month
    pub market_cap: Option<f64>,
}

/// Snapshots per instrument, keyed by month.
pub type SnapshotTable = BTreeMap<SecurityId, BTreeMap<YearMonth, MonthEndSnapshot>>;

/// Reduce daily records to last-of-month snapshots per instrument.
///
/// Records without a usable adjusted price are ignored.
pub fn month_end_snapshots(quotes: &[DailyQuote]) -> SnapshotTable {
    let mut table = SnapshotTable::new();
    for quote in quotes {
        let Some(adjusted_price) = quote.adjusted_price() else {
            continue;
        };
        let snapshot = MonthEndSnapshot {
            date: quote.date,
            adjusted_price,
            market_cap: quote.market_cap(),
        };
        let months = table.entry(quote.id.clone()).or_default();
        let slot = months
            .entry(YearMonth::from_date(quote.date))
            .or_insert(snapshot);
        if snapshot.date >= slot.date {
            *slot = snapshot;
        }
    }
    table
}

fn simple_return(prev: &MonthEndSnapshot, current: &MonthEndSnapshot) -> Option<f64> {
    if prev.adjusted_price <= 0.0 {
        return None;
    }
    let ret = current.adjusted_price / prev.adjusted_price - 1.0;
    ret.is_finite().then_some(ret)
}

/// Returns realized over `month`, one per instrument with snapshots in both
/// `month` and the month before it.
pub fn holding_returns(quotes: &[DailyQuote], month: YearMonth) -> HashMap<SecurityId, HoldingReturn> {
    let prior = month.pred();
    month_end_snapshots(quotes)
        .into_iter()
        .filter_map(|(id, months)| {
            let current = months.get(&month)?;
            let ret = simple_return(months.get(&prior)?, current)?;
            Some((
                id,
                HoldingReturn {
                    ret,
                    market_cap: current.market_cap,
                },
            ))
        })
        .collect()
}

/// Every adjacent-month return per instrument, in month order.
///
/// Months whose predecessor has no snapshot are omitted.
pub fn monthly_return_series(quotes: &[DailyQuote]) -> BTreeMap<SecurityId, Vec<(YearMonth, f64)>> {
    month_end_snapshots(quotes)
        .into_iter()
        .map(|(id, months)| {
            let series = months
                .iter()
                .filter_map(|(month, current)| {
                    let prev = months.get(&month.pred())?;
                    simple_return(prev, current).map(|r| (*month, r))
                })
                .collect();
            (id, series)
        })
        .collect()
}

/// Simple returns between consecutive trading days per instrument.
///
/// The first priced day of each instrument has no return. Duplicate dates
/// keep the last record.
pub fn daily_returns(quotes: &[DailyQuote]) -> BTreeMap<SecurityId, Vec<(NaiveDate, f64)>> {
    let mut prices: BTreeMap<SecurityId, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for quote in quotes {
        if let Some(price) = quote.adjusted_price() {
            prices
                .entry(quote.id.clone())
                .or_default()
                .insert(quote.date, price);
        }
    }

    prices
        .into_iter()
        .map(|(id, series)| {
            let returns = series
                .iter()
                .zip(series.iter().skip(1))
                .filter_map(|((_, prev), (date, price))| {
                    if *prev <= 0.0 {
                        return None;
                    }
                    let ret = price / prev - 1.0;
                    ret.is_finite().then_some((*date, ret))
                })
                .collect();
            (id, returns)
        })
        .collect()
}
