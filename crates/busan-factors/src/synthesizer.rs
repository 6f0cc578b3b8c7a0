//! Monthly factor synthesis.
//!
//! Each holding month goes `pending -> computed | skipped`. Portfolios are
//! formed on a trading date at or before the first day of the previous month
//! and returns are measured over the holding month itself, so membership never
//! depends on the returns it is used to weight.

use crate::aggregate::{Aggregate, value_weighted};
use crate::error::{FactorError, Result};
use crate::history::{FactorHistory, MonthlyFactorRecord};
use crate::observer::RunObserver;
use crate::portfolio::{PortfolioConfig, PortfolioFormer, PortfolioLabel, SizeBucket, ValueBucket};
use crate::returns::{HoldingReturn, holding_returns};
use crate::risk_free::RiskFreeSchedule;
use busan_data::{SecurityDataGateway, SecurityId, SecurityObservation, SecurityStore, YearMonth};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Configuration for the factor synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    /// Months with a smaller universe are skipped (default: 100)
    pub min_universe: usize,
    /// Calendar days searched back for a formation trading date (default: 10)
    pub max_days_back: u32,
    /// Portfolio breakpoints
    pub portfolio: PortfolioConfig,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            min_universe: 100,
            max_days_back: 10,
            portfolio: PortfolioConfig::default(),
        }
    }
}

/// Why a month produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Eligible universe below the configured minimum
    UniverseTooSmall {
        /// Eligible securities found
        found: usize,
        /// Minimum required
        required: usize,
    },
    /// No universe member has a return over the holding month
    NoHoldingReturns {
        /// Eligible securities at formation
        universe: usize,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UniverseTooSmall { found, required } => {
                write!(f, "universe of {} securities is below the minimum of {}", found, required)
            }
            Self::NoHoldingReturns { universe } => {
                write!(f, "none of {} securities has a holding-month return", universe)
            }
        }
    }
}

/// Result of one month.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthOutcome {
    /// A factor record was produced
    Computed(MonthlyFactorRecord),
    /// The month was skipped
    Skipped(SkipReason),
}

/// Dates involved in computing one holding month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSchedule {
    /// Holding month
    pub month: YearMonth,
    /// Unresolved formation target: first day of the previous month
    pub formation_target: NaiveDate,
    /// First day of price data needed (start of the previous month)
    pub prices_from: NaiveDate,
    /// Last day of the holding month
    pub prices_to: NaiveDate,
}

impl MonthSchedule {
    /// Schedule for `month`.
    pub fn for_month(month: YearMonth) -> Self {
        let prior = month.pred();
        Self {
            month,
            formation_target: prior.first_day(),
            prices_from: prior.first_day(),
            prices_to: month.last_day(),
        }
    }
}

/// Value-weighted returns of the six portfolios and the market for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReturns {
    /// Per-portfolio aggregates
    pub portfolios: BTreeMap<PortfolioLabel, Aggregate>,
    /// Market aggregate over the whole universe
    pub market: Aggregate,
}

impl PortfolioReturns {
    fn get(&self, size: SizeBucket, value: ValueBucket) -> f64 {
        self.portfolios
            .get(&PortfolioLabel::new(size, value))
            .map_or(0.0, Aggregate::value)
    }

    /// `mean(S/V, S/N, S/G) - mean(B/V, B/N, B/G)` as a decimal.
    pub fn smb(&self) -> f64 {
        let side = |size| {
            (self.get(size, ValueBucket::Value)
                + self.get(size, ValueBucket::Neutral)
                + self.get(size, ValueBucket::Growth))
                / 3.0
        };
        side(SizeBucket::Small) - side(SizeBucket::Big)
    }

    /// `mean(S/V, B/V) - mean(S/G, B/G)` as a decimal.
    pub fn hml(&self) -> f64 {
        let side = |value| (self.get(SizeBucket::Small, value) + self.get(SizeBucket::Big, value)) / 2.0;
        side(ValueBucket::Value) - side(ValueBucket::Growth)
    }
}

/// Builds monthly factor records.
#[derive(Debug, Clone, Default)]
pub struct FactorSynthesizer {
    config: SynthesizerConfig,
    former: PortfolioFormer,
    risk_free: RiskFreeSchedule,
}

impl FactorSynthesizer {
    /// Create a synthesizer.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the portfolio breakpoints are not valid.
    pub fn new(config: SynthesizerConfig, risk_free: RiskFreeSchedule) -> Result<Self> {
        Ok(Self {
            config,
            former: PortfolioFormer::with_config(config.portfolio)?,
            risk_free,
        })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Risk-free schedule in use.
    pub const fn risk_free(&self) -> &RiskFreeSchedule {
        &self.risk_free
    }

    /// Form portfolios over `universe` and aggregate holding-month returns.
    ///
    /// Degenerate aggregates and thin portfolios are reported to `observer`.
    pub fn portfolio_returns(
        &self,
        month: YearMonth,
        universe: &[SecurityObservation],
        returns: &HashMap<SecurityId, HoldingReturn>,
        observer: &mut dyn RunObserver,
    ) -> PortfolioReturns {
        let portfolios = self.former.form(universe);
        for (label, members) in self.former.thin_portfolios(&portfolios) {
            observer.thin_portfolio(month, label, members);
        }

        let aggregates = portfolios
            .iter()
            .map(|(label, members)| {
                let aggregate = value_weighted(members, returns);
                if aggregate.is_degenerate() {
                    observer.degenerate_aggregate(month, Some(label), &aggregate);
                }
                tracing::debug!(%month, portfolio = %label, members = members.len(), ret = aggregate.value(), "portfolio return");
                (label, aggregate)
            })
            .collect();

        let market = value_weighted(universe.iter().map(|o| &o.id), returns);
        if market.is_degenerate() {
            observer.degenerate_aggregate(month, None, &market);
        }

        PortfolioReturns {
            portfolios: aggregates,
            market,
        }
    }

    /// Compute one month from an already retrieved universe and its holding
    /// returns. No I/O.
    ///
    /// The month is skipped when the universe is too small or when no member
    /// has a holding-month return.
    pub fn synthesize(
        &self,
        month: YearMonth,
        universe: &[SecurityObservation],
        returns: &HashMap<SecurityId, HoldingReturn>,
        observer: &mut dyn RunObserver,
    ) -> MonthOutcome {
        if universe.len() < self.config.min_universe {
            return MonthOutcome::Skipped(SkipReason::UniverseTooSmall {
                found: universe.len(),
                required: self.config.min_universe,
            });
        }

        if !universe.iter().any(|o| returns.contains_key(&o.id)) {
            return MonthOutcome::Skipped(SkipReason::NoHoldingReturns {
                universe: universe.len(),
            });
        }

        let returns = self.portfolio_returns(month, universe, returns, observer);
        let rf = self.risk_free.rate_for(month);

        MonthOutcome::Computed(MonthlyFactorRecord {
            date: month.last_day(),
            mkt: (returns.market.value() - rf) * 100.0,
            smb: returns.smb() * 100.0,
            hml: returns.hml() * 100.0,
            rf: rf * 100.0,
        })
    }

    /// Retrieve data for `month` through `gateway` and compute it.
    pub fn compute_month<S: SecurityStore>(
        &self,
        gateway: &SecurityDataGateway<S>,
        month: YearMonth,
        observer: &mut dyn RunObserver,
    ) -> Result<MonthOutcome> {
        let schedule = MonthSchedule::for_month(month);
        let formation_date =
            gateway.resolve_formation_date(schedule.formation_target, self.config.max_days_back)?;

        tracing::debug!(
            %month,
            %formation_date,
            from = %schedule.prices_from,
            to = %schedule.prices_to,
            "month schedule"
        );

        let universe = gateway.universe(formation_date)?;
        if universe.len() < self.config.min_universe {
            return Ok(MonthOutcome::Skipped(SkipReason::UniverseTooSmall {
                found: universe.len(),
                required: self.config.min_universe,
            }));
        }

        let mut gvkeys: Vec<String> = universe.iter().map(|o| o.id.gvkey.clone()).collect();
        gvkeys.dedup();
        let prices = gateway.daily_prices(&gvkeys, schedule.prices_from, schedule.prices_to)?;
        let returns = holding_returns(&prices, month);

        tracing::debug!(%month, universe = universe.len(), with_returns = returns.len(), "holding returns");

        Ok(self.synthesize(month, &universe, &returns, observer))
    }

    /// Compute the given months in order, collecting computed records.
    ///
    /// Skipped and failed months are reported to `observer` and never stop
    /// the run.
    pub fn compute_months<S: SecurityStore>(
        &self,
        gateway: &SecurityDataGateway<S>,
        months: impl IntoIterator<Item = YearMonth>,
        observer: &mut dyn RunObserver,
    ) -> FactorHistory {
        let mut history = FactorHistory::new();
        for month in months {
            observer.month_started(month);
            match self.compute_month(gateway, month, observer) {
                Ok(MonthOutcome::Computed(record)) => {
                    observer.month_computed(month, &record);
                    history.insert(record);
                }
                Ok(MonthOutcome::Skipped(reason)) => observer.month_skipped(month, &reason),
                Err(error) => observer.month_failed(month, &error),
            }
        }
        history
    }

    /// Compute every month from `start` to `end` inclusive.
    pub fn compute_range<S: SecurityStore>(
        &self,
        gateway: &SecurityDataGateway<S>,
        start: YearMonth,
        end: YearMonth,
        observer: &mut dyn RunObserver,
    ) -> Result<FactorHistory> {
        if start > end {
            return Err(FactorError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(self.compute_months(gateway, YearMonth::range_inclusive(start, end), observer))
    }
}
