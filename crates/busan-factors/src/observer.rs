//! Run-scoped reporting of month-level events.
//!
//! The synthesizer never configures logging itself; callers hand it an
//! observer for the duration of one run.

use crate::aggregate::Aggregate;
use crate::error::FactorError;
use crate::history::MonthlyFactorRecord;
use crate::portfolio::PortfolioLabel;
use crate::synthesizer::SkipReason;
use busan_data::YearMonth;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Receives month-level events during a factor run.
///
/// Every method has an empty default so observers implement only what they
/// need.
pub trait RunObserver {
    /// A month is about to be computed.
    fn month_started(&mut self, _month: YearMonth) {}

    /// A month produced a record.
    fn month_computed(&mut self, _month: YearMonth, _record: &MonthlyFactorRecord) {}

    /// A month was skipped for lack of data.
    fn month_skipped(&mut self, _month: YearMonth, _reason: &SkipReason) {}

    /// A month failed on a retrieval error.
    fn month_failed(&mut self, _month: YearMonth, _error: &FactorError) {}

    /// A portfolio (or the market) aggregated to the zero fallback.
    fn degenerate_aggregate(&mut self, _month: YearMonth, _label: Option<PortfolioLabel>, _aggregate: &Aggregate) {}

    /// A portfolio has fewer members than the configured minimum.
    fn thin_portfolio(&mut self, _month: YearMonth, _label: PortfolioLabel, _members: usize) {}
}

impl<O: RunObserver + ?Sized> RunObserver for &mut O {
    fn month_started(&mut self, month: YearMonth) {
        (**self).month_started(month);
    }

    fn month_computed(&mut self, month: YearMonth, record: &MonthlyFactorRecord) {
        (**self).month_computed(month, record);
    }

    fn month_skipped(&mut self, month: YearMonth, reason: &SkipReason) {
        (**self).month_skipped(month, reason);
    }

    fn month_failed(&mut self, month: YearMonth, error: &FactorError) {
        (**self).month_failed(month, error);
    }

    fn degenerate_aggregate(&mut self, month: YearMonth, label: Option<PortfolioLabel>, aggregate: &Aggregate) {
        (**self).degenerate_aggregate(month, label, aggregate);
    }

    fn thin_portfolio(&mut self, month: YearMonth, label: PortfolioLabel, members: usize) {
        (**self).thin_portfolio(month, label, members);
    }
}

/// Fans events out to two observers.
impl<A: RunObserver, B: RunObserver> RunObserver for (A, B) {
    fn month_started(&mut self, month: YearMonth) {
        self.0.month_started(month);
        self.1.month_started(month);
    }

    fn month_computed(&mut self, month: YearMonth, record: &MonthlyFactorRecord) {
        self.0.month_computed(month, record);
        self.1.month_computed(month, record);
    }

    fn month_skipped(&mut self, month: YearMonth, reason: &SkipReason) {
        self.0.month_skipped(month, reason);
        self.1.month_skipped(month, reason);
    }

    fn month_failed(&mut self, month: YearMonth, error: &FactorError) {
        self.0.month_failed(month, error);
        self.1.month_failed(month, error);
    }

    fn degenerate_aggregate(&mut self, month: YearMonth, label: Option<PortfolioLabel>, aggregate: &Aggregate) {
        self.0.degenerate_aggregate(month, label, aggregate);
        self.1.degenerate_aggregate(month, label, aggregate);
    }

    fn thin_portfolio(&mut self, month: YearMonth, label: PortfolioLabel, members: usize) {
        self.0.thin_portfolio(month, label, members);
        self.1.thin_portfolio(month, label, members);
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {}

/// Forwards events to `tracing`.
///
/// Skips and degenerate aggregates are warnings, failures are errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn month_started(&mut self, month: YearMonth) {
        tracing::debug!(%month, "computing factors");
    }

    fn month_computed(&mut self, month: YearMonth, record: &MonthlyFactorRecord) {
        tracing::info!(
            %month,
            mkt = format!("{:.4}", record.mkt),
            smb = format!("{:.4}", record.smb),
            hml = format!("{:.4}", record.hml),
            rf = format!("{:.4}", record.rf),
            "factors computed"
        );
    }

    fn month_skipped(&mut self, month: YearMonth, reason: &SkipReason) {
        tracing::warn!(%month, %reason, "month skipped");
    }

    fn month_failed(&mut self, month: YearMonth, error: &FactorError) {
        tracing::error!(%month, %error, "month failed");
    }

    fn degenerate_aggregate(&mut self, month: YearMonth, label: Option<PortfolioLabel>, aggregate: &Aggregate) {
        let portfolio = label.map_or_else(|| "market".to_string(), |l| l.to_string());
        tracing::warn!(%month, portfolio, ?aggregate, "degenerate aggregation, using zero return");
    }

    fn thin_portfolio(&mut self, month: YearMonth, label: PortfolioLabel, members: usize) {
        tracing::warn!(%month, portfolio = %label, members, "thin portfolio");
    }
}

/// Counts events over one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Months attempted
    pub requested: usize,
    /// Months that produced a record
    pub computed: usize,
    /// Months skipped for lack of data
    pub skipped: usize,
    /// Months that failed on retrieval errors
    pub failed: usize,
    /// Zero-fallback aggregations
    pub degenerate_aggregates: usize,
    /// Portfolios below the member threshold
    pub thin_portfolios: usize,
    /// Months attempted and not computed
    pub missed_months: Vec<YearMonth>,
    #[serde(skip)]
    started: Option<Instant>,
    /// Elapsed time since the first month started
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of attempted months that were computed (%).
    pub fn success_rate(&self) -> f64 {
        if self.requested == 0 {
            0.0
        } else {
            (self.computed as f64 / self.requested as f64) * 100.0
        }
    }

    /// Log a one-line summary of the run.
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            requested = self.requested,
            computed = self.computed,
            skipped = self.skipped,
            failed = self.failed,
            degenerate = self.degenerate_aggregates,
            thin = self.thin_portfolios,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "run complete"
        );
    }

    fn touch(&mut self) {
        if let Some(started) = self.started {
            self.elapsed = started.elapsed();
        }
    }
}

impl RunObserver for RunStats {
    fn month_started(&mut self, _month: YearMonth) {
        self.started.get_or_insert_with(Instant::now);
        self.requested += 1;
    }

    fn month_computed(&mut self, _month: YearMonth, _record: &MonthlyFactorRecord) {
        self.computed += 1;
        self.touch();
    }

    fn month_skipped(&mut self, month: YearMonth, _reason: &SkipReason) {
        self.skipped += 1;
        self.missed_months.push(month);
        self.touch();
    }

    fn month_failed(&mut self, month: YearMonth, _error: &FactorError) {
        self.failed += 1;
        self.missed_months.push(month);
        self.touch();
    }

    fn degenerate_aggregate(&mut self, _month: YearMonth, _label: Option<PortfolioLabel>, _aggregate: &Aggregate) {
        self.degenerate_aggregates += 1;
    }

    fn thin_portfolio(&mut self, _month: YearMonth, _label: PortfolioLabel, _members: usize) {
        self.thin_portfolios += 1;
    }
}
