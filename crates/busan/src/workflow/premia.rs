//! Fama-MacBeth run over the largest listed instruments.
//!
//! The cross-section is the `top_n` instruments by market capitalization on
//! the first trading day of the period. Their daily returns are tested
//! against the monthly factors spread over each trading day.

use crate::error::{BusanError, Result};
use busan_data::{SecurityDataGateway, SecurityId, SecurityStore};
use busan_factors::{FactorHistory, daily_returns};
use busan_premia::{DailyFactorPanel, FamaMacBeth, FamaMacBethConfig, FamaMacBethResult, ReturnSeries};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

/// Configuration of a premia run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PremiaRunConfig {
    /// Instruments in the cross-section (default: 200)
    pub top_n: usize,
    /// Calendar days searched back for the ranking day (default: 10)
    pub max_days_back: u32,
    /// Estimator settings
    pub estimator: FamaMacBethConfig,
}

impl Default for PremiaRunConfig {
    fn default() -> Self {
        Self {
            top_n: 200,
            max_days_back: 10,
            estimator: FamaMacBethConfig::default(),
        }
    }
}

/// Returns and factors prepared for estimation.
#[derive(Debug, Clone)]
pub struct PremiaInputs {
    /// Day the cross-section was ranked on
    pub ranked_on: NaiveDate,
    /// Daily returns of the selected instruments
    pub returns: ReturnSeries,
    /// Daily factors over the trading days of the period
    pub panel: DailyFactorPanel,
}

/// Prepares inputs and runs the two-pass estimator.
#[derive(Debug, Clone, Default)]
pub struct PremiaRun {
    config: PremiaRunConfig,
}

impl PremiaRun {
    /// Create a run.
    pub const fn new(config: PremiaRunConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &PremiaRunConfig {
        &self.config
    }

    /// Select the cross-section and build daily returns and the factor panel
    /// for `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns an error for an inverted range, a failed retrieval, or when no
    /// instrument is priced near `start`.
    pub fn prepare<S: SecurityStore>(
        &self,
        gateway: &SecurityDataGateway<S>,
        history: &FactorHistory,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PremiaInputs> {
        if start > end {
            return Err(BusanError::InvalidInput(format!("start {start} is after end {end}")));
        }

        let ranked_on = gateway.resolve_formation_date(start, self.config.max_days_back)?;
        let top = gateway.top_by_market_cap(ranked_on, self.config.top_n)?;
        if top.is_empty() {
            return Err(BusanError::InvalidInput(format!("no priced instruments on {ranked_on}")));
        }

        let selected: HashSet<SecurityId> = top.iter().map(|q| q.id.clone()).collect();
        let gvkeys: Vec<String> = top
            .iter()
            .map(|q| q.id.gvkey.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // Entities can carry unselected issues; keep only the ranked ones.
        let quotes: Vec<_> = gateway
            .daily_prices(&gvkeys, start, end)?
            .into_iter()
            .filter(|q| selected.contains(&q.id))
            .collect();

        let trading_days: BTreeSet<NaiveDate> = quotes.iter().map(|q| q.date).collect();
        let panel = DailyFactorPanel::from_monthly(history, trading_days.iter().copied());
        let returns = daily_returns(&quotes);

        tracing::info!(
            %ranked_on,
            selected = selected.len(),
            with_returns = returns.len(),
            trading_days = trading_days.len(),
            factor_days = panel.len(),
            "prepared premia inputs"
        );

        Ok(PremiaInputs {
            ranked_on,
            returns,
            panel,
        })
    }

    /// Prepare inputs and estimate factor premia.
    ///
    /// # Errors
    ///
    /// Returns an error when preparation fails or too few securities or
    /// periods survive estimation.
    pub fn run<S: SecurityStore>(
        &self,
        gateway: &SecurityDataGateway<S>,
        history: &FactorHistory,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FamaMacBethResult> {
        let inputs = self.prepare(gateway, history, start, end)?;
        let estimator = FamaMacBeth::new(self.config.estimator);
        Ok(estimator.run(&inputs.returns, &inputs.panel)?)
    }
}
