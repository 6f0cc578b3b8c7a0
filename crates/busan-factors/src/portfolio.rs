//! Size and value portfolio formation.
//!
//! Securities are sorted independently on market capitalization (median split)
//! and book-to-market (30th/70th percentile split) into six portfolios.

use crate::error::{FactorError, Result};
use busan_data::{SecurityId, SecurityObservation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Size side of a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeBucket {
    /// Market cap at or below the median
    Small,
    /// Market cap above the median
    Big,
}

impl SizeBucket {
    /// Single-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Small => "S",
            Self::Big => "B",
        }
    }
}

/// Value side of a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueBucket {
    /// Book-to-market at or below the low breakpoint
    Growth,
    /// Between the breakpoints
    Neutral,
    /// Book-to-market at or above the high breakpoint
    Value,
}

impl ValueBucket {
    /// Code used by the historical factor files.
    ///
    /// These files label growth `H` and value `L`; the letters are kept only
    /// for compatibility at the file boundary.
    pub fn legacy_code(&self) -> &'static str {
        match self {
            Self::Growth => "H",
            Self::Neutral => "M",
            Self::Value => "L",
        }
    }
}

/// One of the six size/value portfolios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortfolioLabel {
    /// Size side
    pub size: SizeBucket,
    /// Value side
    pub value: ValueBucket,
}

impl PortfolioLabel {
    /// All six portfolios, small before big, growth before value.
    pub const ALL: [Self; 6] = [
        Self::new(SizeBucket::Small, ValueBucket::Growth),
        Self::new(SizeBucket::Small, ValueBucket::Neutral),
        Self::new(SizeBucket::Small, ValueBucket::Value),
        Self::new(SizeBucket::Big, ValueBucket::Growth),
        Self::new(SizeBucket::Big, ValueBucket::Neutral),
        Self::new(SizeBucket::Big, ValueBucket::Value),
    ];

    /// Create a label.
    pub const fn new(size: SizeBucket, value: ValueBucket) -> Self {
        Self { size, value }
    }

    /// Legacy `S/L`-style code.
    pub fn legacy_code(&self) -> String {
        format!("{}/{}", self.size.code(), self.value.legacy_code())
    }
}

impl fmt::Display for PortfolioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.size.code(), self.value.legacy_code())
    }
}

/// Quantile of ascending-sorted values by linear interpolation between order
/// statistics. `None` for empty input.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

fn sorted_values(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.filter(|x| x.is_finite()).collect();
    v.sort_by(f64::total_cmp);
    v
}

/// Breakpoint configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Size split quantile (default: 0.5)
    pub size_quantile: f64,
    /// Growth breakpoint quantile (default: 0.3)
    pub growth_quantile: f64,
    /// Value breakpoint quantile (default: 0.7)
    pub value_quantile: f64,
    /// Portfolios with fewer members are reported as thin (default: 5)
    pub min_members: usize,
}

impl PortfolioConfig {
    /// Check that every quantile lies in `[0, 1]` and the growth breakpoint
    /// does not exceed the value breakpoint.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the offending value.
    pub fn validate(&self) -> Result<()> {
        for (name, q) in [
            ("size_quantile", self.size_quantile),
            ("growth_quantile", self.growth_quantile),
            ("value_quantile", self.value_quantile),
        ] {
            if !(0.0..=1.0).contains(&q) {
                return Err(FactorError::InvalidConfig(format!("{name} must be within [0, 1], got {q}")));
            }
        }
        if self.growth_quantile > self.value_quantile {
            return Err(FactorError::InvalidConfig(format!(
                "growth_quantile {} exceeds value_quantile {}",
                self.growth_quantile, self.value_quantile
            )));
        }
        Ok(())
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            size_quantile: 0.5,
            growth_quantile: 0.3,
            value_quantile: 0.7,
            min_members: 5,
        }
    }
}

/// Breakpoints for one formation date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoints {
    /// Median market cap
    pub size: f64,
    /// Growth breakpoint (30th percentile book-to-market)
    pub growth: f64,
    /// Value breakpoint (70th percentile book-to-market)
    pub value: f64,
}

impl Breakpoints {
    /// Compute breakpoints over a universe. `None` when it is empty.
    pub fn compute(universe: &[SecurityObservation], config: &PortfolioConfig) -> Option<Self> {
        let caps = sorted_values(universe.iter().map(|o| o.market_cap));
        let ratios = sorted_values(universe.iter().map(|o| o.book_to_market));
        Some(Self {
            size: quantile_sorted(&caps, config.size_quantile)?,
            growth: quantile_sorted(&ratios, config.growth_quantile)?,
            value: quantile_sorted(&ratios, config.value_quantile)?,
        })
    }

    /// Size side for a market cap.
    pub fn size_bucket(&self, market_cap: f64) -> SizeBucket {
        if market_cap <= self.size {
            SizeBucket::Small
        } else {
            SizeBucket::Big
        }
    }

    /// Value side for a book-to-market ratio.
    ///
    /// The growth test runs first, so when both breakpoints coincide a ratio
    /// equal to them is growth and the neutral portfolio is empty.
    pub fn value_bucket(&self, book_to_market: f64) -> ValueBucket {
        if book_to_market <= self.growth {
            ValueBucket::Growth
        } else if book_to_market >= self.value {
            ValueBucket::Value
        } else {
            ValueBucket::Neutral
        }
    }

    /// Portfolio for a security.
    pub fn classify(&self, observation: &SecurityObservation) -> PortfolioLabel {
        PortfolioLabel::new(
            self.size_bucket(observation.market_cap),
            self.value_bucket(observation.book_to_market),
        )
    }
}

/// Six disjoint portfolios formed on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolios {
    breakpoints: Option<Breakpoints>,
    members: BTreeMap<PortfolioLabel, Vec<SecurityId>>,
}

impl Portfolios {
    /// Breakpoints used, `None` for an empty universe.
    pub fn breakpoints(&self) -> Option<&Breakpoints> {
        self.breakpoints.as_ref()
    }

    /// Members of one portfolio.
    pub fn members(&self, label: PortfolioLabel) -> &[SecurityId] {
        self.members.get(&label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate all six portfolios in label order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (PortfolioLabel, &[SecurityId])> + '_ {
        PortfolioLabel::ALL
            .into_iter()
            .map(move |label| (label, self.members(label)))
    }

    /// Total number of assigned securities.
    pub fn total(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    /// Portfolio of a security, if assigned.
    pub fn label_of(&self, id: &SecurityId) -> Option<PortfolioLabel> {
        self.members
            .iter()
            .find(|(_, ids)| ids.contains(id))
            .map(|(label, _)| *label)
    }
}

/// Sorts a universe into six portfolios.
#[derive(Debug, Clone, Default)]
pub struct PortfolioFormer {
    config: PortfolioConfig,
}

impl PortfolioFormer {
    /// Create a former with custom breakpoints.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the breakpoints are not valid.
    pub fn with_config(config: PortfolioConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Assign every security to exactly one portfolio.
    ///
    /// Breakpoints are computed from this universe alone.
    pub fn form(&self, universe: &[SecurityObservation]) -> Portfolios {
        let mut members: BTreeMap<PortfolioLabel, Vec<SecurityId>> =
            PortfolioLabel::ALL.into_iter().map(|l| (l, Vec::new())).collect();

        let breakpoints = Breakpoints::compute(universe, &self.config);
        if let Some(bp) = &breakpoints {
            tracing::debug!(
                size_median = bp.size,
                growth = bp.growth,
                value = bp.value,
                "portfolio breakpoints"
            );
            for observation in universe {
                members
                    .entry(bp.classify(observation))
                    .or_default()
                    .push(observation.id.clone());
            }
        }

        Portfolios {
            breakpoints,
            members,
        }
    }

    /// Portfolios with fewer members than the configured minimum.
    pub fn thin_portfolios(&self, portfolios: &Portfolios) -> Vec<(PortfolioLabel, usize)> {
        portfolios
            .iter()
            .filter(|(_, ids)| ids.len() < self.config.min_members)
            .map(|(label, ids)| (label, ids.len()))
            .collect()
    }
}
