//! Monthly risk-free rate lookup.

use busan_data::YearMonth;
use busan_data::ecos::MonthlyRate;
use std::collections::BTreeMap;

/// Default annual fallback rate (1%).
pub const DEFAULT_ANNUAL_RATE: f64 = 0.01;

/// Monthly risk-free rates as decimal fractions, with a constant fallback for
/// months without an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskFreeSchedule {
    fallback: f64,
    rates: BTreeMap<YearMonth, f64>,
}

impl Default for RiskFreeSchedule {
    fn default() -> Self {
        Self::from_annual(DEFAULT_ANNUAL_RATE)
    }
}

impl RiskFreeSchedule {
    /// Constant monthly rate.
    pub fn constant(monthly: f64) -> Self {
        Self {
            fallback: monthly,
            rates: BTreeMap::new(),
        }
    }

    /// Constant rate from an annual rate, `annual / 12` per month.
    pub fn from_annual(annual: f64) -> Self {
        Self::constant(annual / 12.0)
    }

    /// Add observed monthly rates (stored in percent) over the fallback.
    pub fn with_observed(mut self, rates: impl IntoIterator<Item = MonthlyRate>) -> Self {
        for rate in rates {
            self.rates.insert(rate.month(), rate.as_decimal());
        }
        self
    }

    /// Set the rate of one month.
    pub fn insert(&mut self, month: YearMonth, monthly: f64) {
        self.rates.insert(month, monthly);
    }

    /// Rate for `month`: observed if present, otherwise the fallback.
    pub fn rate_for(&self, month: YearMonth) -> f64 {
        self.rates.get(&month).copied().unwrap_or(self.fallback)
    }

    /// Whether `month` has an observed rate.
    pub fn is_observed(&self, month: YearMonth) -> bool {
        self.rates.contains_key(&month)
    }

    /// Fallback monthly rate.
    pub const fn fallback(&self) -> f64 {
        self.fallback
    }

    /// Number of observed months.
    pub fn observed_months(&self) -> usize {
        self.rates.len()
    }
}
