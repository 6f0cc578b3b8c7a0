//! Calendar month arithmetic.

use crate::error::DataError;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month.
///
/// Internally anchored on the first day of the month, so ordering by value is
/// chronological ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    /// Build a month from a year and a 1-based month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        // Subtracting day-1 days never leaves the month.
        let first = date - Days::new(u64::from(date.day0()));
        Self { first }
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// Month number, 1 through 12.
    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// First calendar day of the month.
    pub const fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Last calendar day of the month.
    pub fn last_day(&self) -> NaiveDate {
        self.succ().first - Days::new(1)
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        Self {
            first: self.first + Months::new(1),
        }
    }

    /// The preceding month.
    pub fn pred(&self) -> Self {
        Self {
            first: self.first - Months::new(1),
        }
    }

    /// `(year, month)` pair.
    pub fn as_tuple(&self) -> (i32, u32) {
        (self.year(), self.month())
    }

    /// Whether `date` falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }

    /// Every month from `start` to `end`, both inclusive, in order.
    ///
    /// Empty when `start > end`.
    pub fn range_inclusive(start: Self, end: Self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(start), |m| Some(m.succ())).take_while(move |m| *m <= end)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = DataError;

    /// Accepts `YYYY-MM` or a full `YYYY-MM-DD` date.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }

        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| DataError::Parse(format!("Invalid month: {}", s)))?;
        let year: i32 = year
            .parse()
            .map_err(|_| DataError::Parse(format!("Invalid year in month: {}", s)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| DataError::Parse(format!("Invalid month number: {}", s)))?;

        Self::new(year, month).ok_or_else(|| DataError::Parse(format!("Invalid month: {}", s)))
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
