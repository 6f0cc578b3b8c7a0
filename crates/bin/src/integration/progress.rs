//! Terminal progress for month-by-month factor runs.

use busan_data::YearMonth;
use busan_factors::{FactorError, MonthlyFactorRecord, RunObserver, SkipReason};
use indicatif::style::TemplateError;
use indicatif::{ProgressBar, ProgressStyle};

/// Advances a progress bar as months finish.
#[derive(Debug)]
pub(crate) struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Bar sized for `months` months.
    pub(crate) fn new(months: usize) -> Result<Self, TemplateError> {
        let bar = ProgressBar::new(months as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("█▓░"),
        );
        Ok(Self { bar })
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Clear the bar with a closing message.
    pub(crate) fn finish(&self, message: &'static str) {
        self.bar.finish_with_message(message);
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl RunObserver for ProgressObserver {
    fn month_started(&mut self, month: YearMonth) {
        self.bar.set_message(month.to_string());
    }

    fn month_computed(&mut self, _month: YearMonth, _record: &MonthlyFactorRecord) {
        self.bar.inc(1);
    }

    fn month_skipped(&mut self, _month: YearMonth, _reason: &SkipReason) {
        self.bar.inc(1);
    }

    fn month_failed(&mut self, _month: YearMonth, _error: &FactorError) {
        self.bar.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_outcome_advances() {
        let month = YearMonth::new(2021, 3).unwrap();
        let mut progress = ProgressObserver::hidden();

        progress.month_started(month);
        progress.month_skipped(
            month,
            &SkipReason::UniverseTooSmall {
                found: 1,
                required: 100,
            },
        );
        progress.month_started(month.succ());
        progress.month_computed(
            month.succ(),
            &MonthlyFactorRecord {
                date: month.succ().last_day(),
                mkt: 0.0,
                smb: 0.0,
                hml: 0.0,
                rf: 0.0,
            },
        );

        assert_eq!(progress.position(), 2);
    }

    #[test]
    fn test_template_is_valid() {
        assert!(ProgressObserver::new(12).is_ok());
    }
}
