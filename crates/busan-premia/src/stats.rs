//! Descriptive statistics and t-tests.

use crate::error::{PremiaError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;
use std::fmt;

/// Significance level of a two-sided test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Significance {
    /// p >= 0.10
    None,
    /// p < 0.10
    Weak,
    /// p < 0.05
    Moderate,
    /// p < 0.01
    Strong,
}

impl Significance {
    /// Level for a p-value.
    pub fn from_p_value(p: f64) -> Self {
        if p < 0.01 {
            Self::Strong
        } else if p < 0.05 {
            Self::Moderate
        } else if p < 0.10 {
            Self::Weak
        } else {
            Self::None
        }
    }

    /// `***`, `**`, `*` or empty.
    pub const fn stars(&self) -> &'static str {
        match self {
            Self::Strong => "***",
            Self::Moderate => "**",
            Self::Weak => "*",
            Self::None => "",
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stars())
    }
}

/// One-sample t-test of a mean against zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTest {
    /// Number of observations
    pub n: usize,
    /// Sample mean
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    /// Standard error of the mean
    pub std_error: f64,
    /// t statistic
    pub t_stat: f64,
    /// Two-sided p-value from Student's t with n - 1 degrees of freedom
    pub p_value: f64,
}

impl TTest {
    /// Test `H0: mean = 0` over `values`.
    ///
    /// # Errors
    /// Returns `InsufficientData` for fewer than two observations.
    pub fn mean_zero(values: &[f64]) -> Result<Self> {
        let n = values.len();
        if n < 2 {
            return Err(PremiaError::InsufficientData {
                stage: "t-test",
                required: 2,
                actual: n,
            });
        }

        let mean = values.mean();
        let std_dev = values.std_dev();
        let std_error = std_dev / (n as f64).sqrt();

        let (t_stat, p_value) = if std_error > 0.0 {
            let t = mean / std_error;
            let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64)
                .map_err(|e| PremiaError::Distribution(e.to_string()))?;
            (t, 2.0 * (1.0 - dist.cdf(t.abs())))
        } else if mean == 0.0 {
            (0.0, 1.0)
        } else {
            (mean.signum() * f64::INFINITY, 0.0)
        };

        Ok(Self {
            n,
            mean,
            std_dev,
            std_error,
            t_stat,
            p_value,
        })
    }

    /// Significance level of the test.
    pub fn significance(&self) -> Significance {
        Significance::from_p_value(self.p_value)
    }
}

/// Summary statistics of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    /// Number of observations
    pub count: usize,
    /// Mean
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Minimum
    pub min: f64,
    /// 25th percentile
    pub q25: f64,
    /// Median
    pub median: f64,
    /// 75th percentile
    pub q75: f64,
    /// Maximum
    pub max: f64,
}

impl Describe {
    /// Describe `values`. `None` when empty.
    ///
    /// Percentiles interpolate linearly between order statistics.
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let quantile = |q: f64| busan_factors::portfolio::quantile_sorted(&sorted, q).unwrap_or(f64::NAN);

        Some(Self {
            count: values.len(),
            mean: values.mean(),
            std: if values.len() > 1 { values.std_dev() } else { f64::NAN },
            min: sorted[0],
            q25: quantile(0.25),
            median: quantile(0.5),
            q75: quantile(0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Pearson correlation. `None` for mismatched or too short inputs, or a
/// constant series.
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let mean_a = a.mean();
    let mean_b = b.mean();
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    (denom > 0.0).then(|| cov / denom)
}
