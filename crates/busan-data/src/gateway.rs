//! Security data gateway.
//!
//! Builds the eligible universe for a formation date: every priced instrument
//! with positive shares outstanding whose entity has positive trailing book
//! equity, together with its market capitalization and book-to-market ratio.

use crate::error::Result;
use crate::model::{DailyQuote, SecurityObservation};
use crate::store::SecurityStore;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Default market code.
pub const DEFAULT_MARKET: &str = "KOR";

/// Fundamentals are searched from January 1 of this many years before the
/// reference year.
pub const FUNDAMENTALS_LOOKBACK_YEARS: i32 = 2;

/// Read-only view of a security store for one market.
#[derive(Debug, Clone)]
pub struct SecurityDataGateway<S> {
    store: S,
    market: String,
}

impl<S: SecurityStore> SecurityDataGateway<S> {
    /// Create a gateway over `store` for `market`.
    pub fn new(store: S, market: impl Into<String>) -> Self {
        Self {
            store,
            market: market.into(),
        }
    }

    /// Market code this gateway reads.
    pub fn market(&self) -> &str {
        &self.market
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Nearest trading date on or before `target`, searching back at most
    /// `max_days_back` calendar days.
    ///
    /// Falls back to `target` itself when no trading date is found.
    pub fn resolve_formation_date(&self, target: NaiveDate, max_days_back: u32) -> Result<NaiveDate> {
        match self
            .store
            .latest_trading_day(&self.market, target, max_days_back)?
        {
            Some(date) => {
                tracing::debug!(%target, trading_day = %date, "resolved trading day");
                Ok(date)
            }
            None => {
                tracing::warn!(%target, max_days_back, "no trading day found, using target date");
                Ok(target)
            }
        }
    }

    /// Eligible universe on `date`.
    ///
    /// Instruments are kept when price, adjustment factor and shares are
    /// positive and their entity has positive book equity reported between
    /// January 1 two years before `date`'s year and `date`. The most recent
    /// such report is used. Output is ordered by instrument.
    pub fn universe(&self, date: NaiveDate) -> Result<Vec<SecurityObservation>> {
        let quotes = self.store.securities_on(&self.market, date)?;
        let since = lookback_start(date);
        let fundamentals = self.store.fundamentals(&self.market, since, date)?;

        let mut latest_book: HashMap<&str, (NaiveDate, f64)> = HashMap::new();
        for record in &fundamentals {
            if !(record.book_equity.is_finite() && record.book_equity > 0.0) {
                continue;
            }
            let entry = latest_book
                .entry(record.gvkey.as_str())
                .or_insert((record.date, record.book_equity));
            if record.date > entry.0 {
                *entry = (record.date, record.book_equity);
            }
        }

        let priced = quotes.len();
        let mut universe: Vec<SecurityObservation> = quotes
            .into_iter()
            .filter_map(|quote| {
                let book_equity = latest_book.get(quote.id.gvkey.as_str())?.1;
                observe(quote, book_equity)
            })
            .collect();
        universe.sort_by(|a, b| a.id.cmp(&b.id));

        tracing::info!(
            %date,
            priced,
            with_fundamentals = latest_book.len(),
            eligible = universe.len(),
            "built universe"
        );

        Ok(universe)
    }

    /// Priced daily records for the given entities between `start` and `end`.
    pub fn daily_prices(
        &self,
        gvkeys: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyQuote>> {
        self.store.price_series(gvkeys, start, end)
    }

    /// The `n` largest instruments by market capitalization on `date`.
    pub fn top_by_market_cap(&self, date: NaiveDate, n: usize) -> Result<Vec<DailyQuote>> {
        self.store.top_by_market_cap(&self.market, date, n)
    }
}

/// January 1 of the year `FUNDAMENTALS_LOOKBACK_YEARS` before `date`'s year.
pub fn lookback_start(date: NaiveDate) -> NaiveDate {
    let year = date.year() - FUNDAMENTALS_LOOKBACK_YEARS;
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn observe(quote: DailyQuote, book_equity: f64) -> Option<SecurityObservation> {
    if !(quote.price.is_finite() && quote.price > 0.0) {
        return None;
    }
    let adjustment = quote.adjustment.filter(|a| a.is_finite() && *a > 0.0)?;
    let shares = quote.shares.filter(|s| s.is_finite() && *s > 0.0)?;
    let market_cap = quote.market_cap().filter(|c| *c > 0.0)?;
    let book_to_market = book_equity / market_cap;
    if !book_to_market.is_finite() {
        return None;
    }

    Some(SecurityObservation {
        id: quote.id,
        date: quote.date,
        name: quote.name,
        price: quote.price,
        adjustment,
        shares,
        market_cap,
        book_equity,
        book_to_market,
    })
}
