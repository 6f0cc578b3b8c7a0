//! Summary statistics of a factor history.
//!
//! For each of MKT, SMB and HML: descriptive statistics of the monthly
//! percentages, the annualized mean and volatility, a t-test of the mean
//! against zero and an annualized Sharpe ratio against the mean risk-free
//! rate. Also the pairwise correlation matrix of the three factors.

use busan_factors::{FactorHistory, MonthlyFactorRecord};
use busan_premia::stats::{Describe, TTest, correlation};
use busan_premia::{PremiaError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Months per year used to annualize monthly statistics.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Factor columns covered by the summary.
pub const FACTOR_NAMES: [&str; 3] = ["MKT", "SMB", "HML"];

fn column(name: &str) -> fn(&MonthlyFactorRecord) -> f64 {
    match name {
        "MKT" => |r| r.mkt,
        "SMB" => |r| r.smb,
        _ => |r| r.hml,
    }
}

/// Statistics of one factor column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorStatistics {
    /// Column name
    pub name: String,
    /// Descriptive statistics, monthly percent
    pub describe: Describe,
    /// Mean times 12
    pub annualized_mean: f64,
    /// Standard deviation times the square root of 12
    pub annualized_volatility: f64,
    /// Test of the monthly mean against zero
    pub test: TTest,
    /// `((mean - mean RF) * 12) / (std * sqrt(12))`, absent for a flat series
    pub sharpe: Option<f64>,
}

/// Summary of a factor history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorSummary {
    /// First month end
    pub period_start: NaiveDate,
    /// Last month end
    pub period_end: NaiveDate,
    /// Number of months
    pub months: usize,
    /// Mean monthly risk-free rate, percent
    pub rf_mean: f64,
    /// Per-factor statistics in [`FACTOR_NAMES`] order
    pub factors: Vec<FactorStatistics>,
    /// Pairwise correlations in [`FACTOR_NAMES`] order
    pub correlations: [[Option<f64>; 3]; 3],
}

impl FactorSummary {
    /// Summarize `history`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyData` for an empty history and `InsufficientData` for a
    /// single month.
    pub fn from_history(history: &FactorHistory) -> Result<Self> {
        let (Some(first), Some(last)) = (history.iter().next(), history.iter().next_back()) else {
            return Err(PremiaError::EmptyData);
        };

        let rf = history.column(|r| r.rf);
        let rf_mean = rf.iter().sum::<f64>() / rf.len() as f64;
        let columns: Vec<Vec<f64>> = FACTOR_NAMES.iter().map(|name| history.column(column(name))).collect();

        let factors = FACTOR_NAMES
            .iter()
            .zip(&columns)
            .map(|(name, values)| {
                let test = TTest::mean_zero(values)?;
                let describe = Describe::of(values).ok_or(PremiaError::EmptyData)?;
                let annualized_volatility = test.std_dev * MONTHS_PER_YEAR.sqrt();
                let sharpe = (annualized_volatility > 0.0)
                    .then(|| (test.mean - rf_mean) * MONTHS_PER_YEAR / annualized_volatility);

                Ok(FactorStatistics {
                    name: (*name).to_string(),
                    describe,
                    annualized_mean: test.mean * MONTHS_PER_YEAR,
                    annualized_volatility,
                    test,
                    sharpe,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut correlations = [[None; 3]; 3];
        for (i, a) in columns.iter().enumerate() {
            for (j, b) in columns.iter().enumerate() {
                correlations[i][j] = correlation(a, b);
            }
        }

        Ok(Self {
            period_start: first.date,
            period_end: last.date,
            months: history.len(),
            rf_mean,
            factors,
            correlations,
        })
    }

    /// Statistics of one factor by column name.
    pub fn factor(&self, name: &str) -> Option<&FactorStatistics> {
        self.factors.iter().find(|f| f.name == name)
    }

    /// Correlation between two factors by column name.
    pub fn correlation(&self, a: &str, b: &str) -> Option<f64> {
        let i = FACTOR_NAMES.iter().position(|n| *n == a)?;
        let j = FACTOR_NAMES.iter().position(|n| *n == b)?;
        self.correlations[i][j]
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nFactor Summary: {} to {} ({} months)\n",
            self.period_start, self.period_end, self.months
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("\nDescriptive Statistics (monthly %):\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<6} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        ));
        for factor in &self.factors {
            let d = &factor.describe;
            output.push_str(&format!(
                "{:<6} {:>6} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4}\n",
                factor.name, d.count, d.mean, d.std, d.min, d.q25, d.median, d.q75, d.max
            ));
        }

        output.push_str("\nAnnualized:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<6} {:>10} {:>12} {:>9} {:>10} {:>6} {:>8}\n",
            "", "mean %", "volatility %", "t-stat", "p-value", "sig", "Sharpe"
        ));
        for factor in &self.factors {
            let sharpe = factor
                .sharpe
                .map_or_else(|| "n/a".to_string(), |s| format!("{s:.3}"));
            output.push_str(&format!(
                "{:<6} {:>10.2} {:>12.2} {:>9.2} {:>10.4} {:>6} {:>8}\n",
                factor.name,
                factor.annualized_mean,
                factor.annualized_volatility,
                factor.test.t_stat,
                factor.test.p_value,
                factor.test.significance().stars(),
                sharpe
            ));
        }

        output.push_str("\nCorrelation:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!("{:<6}", ""));
        for name in FACTOR_NAMES {
            output.push_str(&format!(" {name:>8}"));
        }
        output.push('\n');
        for (name, row) in FACTOR_NAMES.iter().zip(&self.correlations) {
            output.push_str(&format!("{name:<6}"));
            for value in row {
                match value {
                    Some(v) => output.push_str(&format!(" {v:>8.3}")),
                    None => output.push_str(&format!(" {:>8}", "n/a")),
                }
            }
            output.push('\n');
        }

        output.push_str(&format!("\nMean RF: {:.4}% per month\n", self.rf_mean));
        output.push_str("Note: *** p<0.01, ** p<0.05, * p<0.1\n");
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Factor Summary\n\n");
        output.push_str(&format!(
            "**Period:** {} to {} ({} months)\n\n",
            self.period_start, self.period_end, self.months
        ));
        output.push_str("| Factor | Mean % | Std % | Ann. Mean % | t-stat | p-value | Sharpe |\n");
        output.push_str("|--------|--------|-------|-------------|--------|---------|--------|\n");
        for factor in &self.factors {
            let sharpe = factor
                .sharpe
                .map_or_else(|| "n/a".to_string(), |s| format!("{s:.3}"));
            output.push_str(&format!(
                "| {} | {:.4} | {:.4} | {:.2} | {:.2}{} | {:.4} | {} |\n",
                factor.name,
                factor.describe.mean,
                factor.describe.std,
                factor.annualized_mean,
                factor.test.t_stat,
                factor.test.significance().stars(),
                factor.test.p_value,
                sharpe
            ));
        }

        output
    }
}

impl fmt::Display for FactorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Factor Summary: {} to {} ({} months)",
            self.period_start, self.period_end, self.months
        )?;
        for factor in &self.factors {
            writeln!(
                f,
                "  {}: {:.2}% p.a. (t = {:.2}{})",
                factor.name,
                factor.annualized_mean,
                factor.test.t_stat,
                factor.test.significance()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use busan_data::YearMonth;

    fn history(rows: &[(f64, f64, f64)]) -> FactorHistory {
        let start = YearMonth::new(2021, 1).unwrap();
        let months = std::iter::successors(Some(start), |m| Some(m.succ()));
        rows.iter()
            .zip(months)
            .map(|(&(mkt, smb, hml), month)| MonthlyFactorRecord {
                date: month.last_day(),
                mkt,
                smb,
                hml,
                rf: 0.1,
            })
            .collect()
    }

    #[test]
    fn test_summary_values() {
        let summary = FactorSummary::from_history(&history(&[
            (1.0, 2.0, -1.0),
            (2.0, 4.0, -2.0),
            (3.0, 6.0, -3.0),
            (4.0, 8.0, -4.0),
        ]))
        .unwrap();

        assert_eq!(summary.months, 4);
        assert_eq!(summary.period_start, NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
        assert_eq!(summary.period_end, NaiveDate::from_ymd_opt(2021, 4, 30).unwrap());
        assert_abs_diff_eq!(summary.rf_mean, 0.1, epsilon = 1e-12);

        let mkt = summary.factor("MKT").unwrap();
        assert_abs_diff_eq!(mkt.annualized_mean, 30.0, epsilon = 1e-12);
        let std = (5.0_f64 / 3.0).sqrt();
        assert_abs_diff_eq!(mkt.annualized_volatility, std * 12.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            mkt.sharpe.unwrap(),
            (2.5 - 0.1) * 12.0 / (std * 12.0_f64.sqrt()),
            epsilon = 1e-12
        );

        assert_abs_diff_eq!(summary.correlation("MKT", "SMB").unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.correlation("MKT", "HML").unwrap(), -1.0, epsilon = 1e-12);
        assert!(summary.correlation("MKT", "RF").is_none());
    }

    #[test]
    fn test_flat_series_has_no_sharpe() {
        let summary = FactorSummary::from_history(&history(&[(1.0, 0.0, 1.0), (2.0, 0.0, -1.0)])).unwrap();
        assert!(summary.factor("SMB").unwrap().sharpe.is_none());
        assert!(summary.correlation("MKT", "SMB").is_none());
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            FactorSummary::from_history(&FactorHistory::new()),
            Err(PremiaError::EmptyData)
        ));
        assert!(FactorSummary::from_history(&history(&[(1.0, 1.0, 1.0)])).is_err());
    }

    #[test]
    fn test_tables_render() {
        let summary = FactorSummary::from_history(&history(&[(1.0, 0.5, 0.2), (-1.0, 0.3, 0.1), (2.0, -0.4, 0.0)]))
            .unwrap();
        let ascii = summary.to_ascii_table();
        assert!(ascii.contains("Descriptive Statistics"));
        assert!(ascii.contains("Correlation"));
        assert!(ascii.contains("HML"));

        let markdown = summary.to_markdown();
        assert!(markdown.contains("| Factor |"));
        assert!(summary.to_string().contains("MKT"));
    }
}
