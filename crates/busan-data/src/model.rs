//! Security-level records returned by the store and the gateway.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one tradable instrument: an entity (`gvkey`) and one of its
/// listed issues (`iid`).
///
/// Entities with dual listings carry several instruments; each one is an
/// independent observation stream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SecurityId {
    /// Entity identifier
    pub gvkey: String,
    /// Issue (instrument) identifier
    pub iid: String,
}

impl SecurityId {
    /// Create a new identifier.
    pub fn new(gvkey: impl Into<String>, iid: impl Into<String>) -> Self {
        Self {
            gvkey: gvkey.into(),
            iid: iid.into(),
        }
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.gvkey, self.iid)
    }
}

/// One daily price record for an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    /// Instrument
    pub id: SecurityId,
    /// Trading date
    pub date: NaiveDate,
    /// Company name, when the source carries it
    pub name: Option<String>,
    /// Closing price in local currency
    pub price: f64,
    /// Cumulative adjustment factor by ex-date
    pub adjustment: Option<f64>,
    /// Shares outstanding
    pub shares: Option<f64>,
}

impl DailyQuote {
    /// Price divided by the adjustment factor.
    ///
    /// `None` when the factor is missing or not positive.
    pub fn adjusted_price(&self) -> Option<f64> {
        self.adjustment
            .filter(|adj| adj.is_finite() && *adj > 0.0)
            .map(|adj| self.price / adj)
            .filter(|p| p.is_finite())
    }

    /// Market capitalization: `price / adjustment * shares`.
    pub fn market_cap(&self) -> Option<f64> {
        let shares = self.shares.filter(|s| s.is_finite())?;
        self.adjusted_price()
            .map(|p| p * shares)
            .filter(|cap| cap.is_finite())
    }
}

/// Annual fundamentals for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    /// Entity identifier
    pub gvkey: String,
    /// Fiscal period end date
    pub date: NaiveDate,
    /// Common equity (book equity)
    pub book_equity: f64,
    /// Total assets
    pub total_assets: Option<f64>,
}

/// An eligible security on a formation date, with derived size and value
/// characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityObservation {
    /// Instrument
    pub id: SecurityId,
    /// Observation date
    pub date: NaiveDate,
    /// Company name
    pub name: Option<String>,
    /// Closing price
    pub price: f64,
    /// Adjustment factor
    pub adjustment: f64,
    /// Shares outstanding
    pub shares: f64,
    /// `price / adjustment * shares`
    pub market_cap: f64,
    /// Most recent trailing book equity
    pub book_equity: f64,
    /// `book_equity / market_cap`
    pub book_to_market: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(price: f64, adjustment: Option<f64>, shares: Option<f64>) -> DailyQuote {
        DailyQuote {
            id: SecurityId::new("100001", "01W"),
            date: NaiveDate::from_ymd_opt(2020, 10, 30).unwrap(),
            name: None,
            price,
            adjustment,
            shares,
        }
    }

    #[test]
    fn test_market_cap() {
        let q = quote(50_000.0, Some(2.0), Some(1_000.0));
        assert_eq!(q.adjusted_price(), Some(25_000.0));
        assert_eq!(q.market_cap(), Some(25_000_000.0));
    }

    #[test]
    fn test_market_cap_missing_inputs() {
        assert_eq!(quote(100.0, None, Some(10.0)).market_cap(), None);
        assert_eq!(quote(100.0, Some(0.0), Some(10.0)).market_cap(), None);
        assert_eq!(quote(100.0, Some(1.0), None).market_cap(), None);
    }

    #[test]
    fn test_security_id_ordering() {
        let a = SecurityId::new("100001", "01W");
        let b = SecurityId::new("100001", "02W");
        let c = SecurityId::new("100002", "01W");
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "100001:01W");
    }
}
