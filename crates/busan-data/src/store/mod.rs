//! Security data stores.
//!
//! The factor pipeline reads the upstream data through three shapes only:
//! the priced securities of a market on one date, daily price series for a
//! set of entities, and trailing fundamentals up to a cutoff date.

pub mod import;
pub mod sqlite;

pub use import::{DailySecurityRow, FundamentalRow, import_daily_csv, import_fundamentals_csv};
pub use sqlite::{SqliteStore, StoreStats};

use crate::error::Result;
use crate::model::{DailyQuote, FundamentalRecord};
use chrono::NaiveDate;

/// Read access to security prices and fundamentals.
pub trait SecurityStore {
    /// Most recent date in `[target - max_days_back, target]` with at least one
    /// priced record for `market`.
    fn latest_trading_day(
        &self,
        market: &str,
        target: NaiveDate,
        max_days_back: u32,
    ) -> Result<Option<NaiveDate>>;

    /// All instruments of `market` priced on `date` with positive shares
    /// outstanding.
    fn securities_on(&self, market: &str, date: NaiveDate) -> Result<Vec<DailyQuote>>;

    /// Priced daily records for every instrument of the given entities between
    /// `start` and `end` inclusive, ordered by entity, instrument and date.
    fn price_series(
        &self,
        gvkeys: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyQuote>>;

    /// Fundamental records of `market` with positive book equity whose period
    /// ends between `since` and `cutoff` inclusive.
    fn fundamentals(
        &self,
        market: &str,
        since: NaiveDate,
        cutoff: NaiveDate,
    ) -> Result<Vec<FundamentalRecord>>;

    /// The `n` largest instruments by market capitalization on `date`.
    fn top_by_market_cap(&self, market: &str, date: NaiveDate, n: usize) -> Result<Vec<DailyQuote>> {
        let mut quotes: Vec<(f64, DailyQuote)> = self
            .securities_on(market, date)?
            .into_iter()
            .filter_map(|q| q.market_cap().map(|cap| (cap, q)))
            .collect();

        quotes.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        quotes.truncate(n);

        if quotes.len() < n {
            tracing::warn!(found = quotes.len(), requested = n, %date, "fewer securities than requested");
        }

        Ok(quotes.into_iter().map(|(_, q)| q).collect())
    }
}

impl<S: SecurityStore + ?Sized> SecurityStore for &S {
    fn latest_trading_day(
        &self,
        market: &str,
        target: NaiveDate,
        max_days_back: u32,
    ) -> Result<Option<NaiveDate>> {
        (**self).latest_trading_day(market, target, max_days_back)
    }

    fn securities_on(&self, market: &str, date: NaiveDate) -> Result<Vec<DailyQuote>> {
        (**self).securities_on(market, date)
    }

    fn price_series(
        &self,
        gvkeys: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyQuote>> {
        (**self).price_series(gvkeys, start, end)
    }

    fn fundamentals(
        &self,
        market: &str,
        since: NaiveDate,
        cutoff: NaiveDate,
    ) -> Result<Vec<FundamentalRecord>> {
        (**self).fundamentals(market, since, cutoff)
    }
}
