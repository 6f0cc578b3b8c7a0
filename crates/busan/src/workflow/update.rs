//! Incremental update of a saved factor history.

use crate::error::Result;
use busan_data::{SecurityDataGateway, SecurityStore, YearMonth};
use busan_factors::{FactorError, FactorHistory, FactorSynthesizer, MergeStats, RunObserver};

/// Result of [`update_history`].
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// Merged history, ordered by month
    pub history: FactorHistory,
    /// Months that were absent before the update
    pub missing: Vec<YearMonth>,
    /// Added and replaced counts
    pub merge: MergeStats,
}

/// Compute the months of `start..=end` that `existing` lacks and merge them in.
///
/// Months already present are not recomputed. Months that cannot be computed
/// stay missing and are reported to `observer`.
///
/// # Errors
///
/// Returns `InvalidRange` when `start` is after `end`.
pub fn update_history<S: SecurityStore>(
    synthesizer: &FactorSynthesizer,
    gateway: &SecurityDataGateway<S>,
    mut existing: FactorHistory,
    start: YearMonth,
    end: YearMonth,
    observer: &mut dyn RunObserver,
) -> Result<UpdateOutcome> {
    if start > end {
        return Err(FactorError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        }
        .into());
    }

    let missing = existing.missing_months(start, end);
    if missing.is_empty() {
        tracing::info!(%start, %end, "history already covers the range");
        return Ok(UpdateOutcome {
            history: existing,
            missing,
            merge: MergeStats::default(),
        });
    }

    tracing::info!(
        months = missing.len(),
        first = %missing[0],
        last = %missing[missing.len() - 1],
        "computing missing months"
    );

    let computed = synthesizer.compute_months(gateway, missing.iter().copied(), observer);
    let merge = existing.merge(computed);

    tracing::info!(added = merge.added, total = existing.len(), "merged factor history");

    Ok(UpdateOutcome {
        history: existing,
        missing,
        merge,
    })
}
