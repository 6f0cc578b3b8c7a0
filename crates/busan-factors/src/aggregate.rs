//! Value-weighted portfolio returns.

use crate::returns::HoldingReturn;
use busan_data::SecurityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a value-weighted aggregation.
///
/// The two degenerate cases carry a zero return so factor differencing can
/// proceed; callers report them since they silently move factor values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Aggregate {
    /// Weighted return over qualifying members
    Weighted(f64),
    /// No member has both a return and a market cap
    Empty,
    /// Qualifying members have zero total market cap
    ZeroWeight,
}

impl Aggregate {
    /// Return value, zero for degenerate cases.
    pub const fn value(&self) -> f64 {
        match self {
            Self::Weighted(r) => *r,
            Self::Empty | Self::ZeroWeight => 0.0,
        }
    }

    /// Whether the zero fallback was used.
    pub const fn is_degenerate(&self) -> bool {
        !matches!(self, Self::Weighted(_))
    }
}

/// `Σ(r_i × cap_i) / Σ cap_i` over members with a finite return and a finite
/// market cap from the holding month.
pub fn value_weighted<'a, I>(members: I, returns: &HashMap<SecurityId, HoldingReturn>) -> Aggregate
where
    I: IntoIterator<Item = &'a SecurityId>,
{
    let mut weighted = 0.0;
    let mut total_cap = 0.0;
    let mut qualifying = 0usize;

    for id in members {
        let Some(holding) = returns.get(id) else {
            continue;
        };
        let Some(cap) = holding.market_cap.filter(|c| c.is_finite()) else {
            continue;
        };
        if !holding.ret.is_finite() {
            continue;
        }
        weighted += holding.ret * cap;
        total_cap += cap;
        qualifying += 1;
    }

    if qualifying == 0 {
        Aggregate::Empty
    } else if total_cap == 0.0 {
        Aggregate::ZeroWeight
    } else {
        Aggregate::Weighted(weighted / total_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn holdings(entries: &[(&str, f64, Option<f64>)]) -> HashMap<SecurityId, HoldingReturn> {
        entries
            .iter()
            .map(|(g, ret, cap)| {
                (
                    SecurityId::new(*g, "01W"),
                    HoldingReturn {
                        ret: *ret,
                        market_cap: *cap,
                    },
                )
            })
            .collect()
    }

    fn ids(keys: &[&str]) -> Vec<SecurityId> {
        keys.iter().map(|k| SecurityId::new(*k, "01W")).collect()
    }

    #[test]
    fn test_two_security_weighting() {
        let returns = holdings(&[("a", 0.10, Some(100.0)), ("b", -0.02, Some(300.0))]);
        let agg = value_weighted(&ids(&["a", "b"]), &returns);
        // (100 * 0.10 + 300 * -0.02) / 400
        assert_relative_eq!(agg.value(), 0.01, epsilon = 1e-12);
        assert!(!agg.is_degenerate());
    }

    #[test]
    fn test_missing_returns_excluded() {
        let returns = holdings(&[("a", 0.10, Some(100.0)), ("c", 0.5, None)]);
        let agg = value_weighted(&ids(&["a", "b", "c"]), &returns);
        assert_relative_eq!(agg.value(), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_is_zero() {
        let returns = holdings(&[("a", 0.10, Some(100.0))]);
        let agg = value_weighted(&ids(&["x", "y"]), &returns);
        assert_eq!(agg, Aggregate::Empty);
        assert_eq!(agg.value(), 0.0);
        assert!(agg.is_degenerate());

        assert_eq!(value_weighted(std::iter::empty(), &returns), Aggregate::Empty);
    }

    #[test]
    fn test_zero_weight_is_zero() {
        let returns = holdings(&[("a", 0.10, Some(0.0)), ("b", -0.3, Some(0.0))]);
        let agg = value_weighted(&ids(&["a", "b"]), &returns);
        assert_eq!(agg, Aggregate::ZeroWeight);
        assert_eq!(agg.value(), 0.0);
    }
}
