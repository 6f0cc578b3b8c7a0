//! Fama-MacBeth two-pass regression.
//!
//! Stage one regresses each security's excess returns on the factor returns
//! over the dates both are observed, giving per-security betas. Stage two
//! regresses, for each date, the cross-section of excess returns on those
//! betas, giving one premium (gamma) per factor and date. The gamma series are
//! then averaged and t-tested against zero.

use crate::error::{PremiaError, Result};
use crate::ols::{ols, with_intercept};
use crate::panel::DailyFactorPanel;
use crate::stats::TTest;
use busan_data::SecurityId;
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Daily returns per security.
pub type ReturnSeries = BTreeMap<SecurityId, Vec<(NaiveDate, f64)>>;

/// Estimator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamaMacBethConfig {
    /// Securities with fewer overlapping days are dropped (default: 100)
    pub min_observations: usize,
    /// Dates with fewer securities are dropped (default: 10)
    pub min_cross_section: usize,
    /// Periods per year used to annualize premia (default: 252)
    pub periods_per_year: f64,
}

impl Default for FamaMacBethConfig {
    fn default() -> Self {
        Self {
            min_observations: 100,
            min_cross_section: 10,
            periods_per_year: 252.0,
        }
    }
}

/// Factors priced in the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PricedFactor {
    /// Market excess return
    Market,
    /// Size
    Size,
    /// Value
    Value,
}

impl PricedFactor {
    /// All factors in regression order.
    pub const ALL: [Self; 3] = [Self::Market, Self::Size, Self::Value];

    /// Display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Market => "Market (Mkt-RF)",
            Self::Size => "Size (SMB)",
            Self::Value => "Value (HML)",
        }
    }
}

impl fmt::Display for PricedFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage-one loadings of one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityBeta {
    /// Security
    pub id: SecurityId,
    /// Intercept
    pub alpha: f64,
    /// Market loading
    pub beta_market: f64,
    /// Size loading
    pub beta_smb: f64,
    /// Value loading
    pub beta_hml: f64,
    /// Fit quality
    pub r_squared: f64,
    /// Overlapping days used
    pub observations: usize,
}

impl SecurityBeta {
    /// Loadings in `[MKT, SMB, HML]` order.
    pub const fn loadings(&self) -> [f64; 3] {
        [self.beta_market, self.beta_smb, self.beta_hml]
    }
}

/// Stage-two premia for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodGamma {
    /// Date
    pub date: NaiveDate,
    /// Intercept
    pub gamma_0: f64,
    /// Market premium
    pub gamma_market: f64,
    /// Size premium
    pub gamma_smb: f64,
    /// Value premium
    pub gamma_hml: f64,
    /// Securities in the cross-section
    pub securities: usize,
}

impl PeriodGamma {
    /// Premium of one factor.
    pub const fn gamma(&self, factor: PricedFactor) -> f64 {
        match factor {
            PricedFactor::Market => self.gamma_market,
            PricedFactor::Size => self.gamma_smb,
            PricedFactor::Value => self.gamma_hml,
        }
    }
}

/// Average premium of one factor and its t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorPremium {
    /// Factor
    pub factor: PricedFactor,
    /// Mean premium per period
    pub mean: f64,
    /// Mean premium times periods per year
    pub annualized: f64,
    /// Test of the mean against zero
    pub test: TTest,
}

/// Output of a full estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct FamaMacBethResult {
    /// Stage-one loadings
    pub betas: Vec<SecurityBeta>,
    /// Stage-two premia per date
    pub gammas: Vec<PeriodGamma>,
    /// Averaged premia
    pub premia: Vec<FactorPremium>,
}

/// Two-pass estimator.
#[derive(Debug, Clone, Default)]
pub struct FamaMacBeth {
    config: FamaMacBethConfig,
}

impl FamaMacBeth {
    /// Create an estimator.
    pub const fn new(config: FamaMacBethConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &FamaMacBethConfig {
        &self.config
    }

    /// Stage one: regress each security's excess return on `[1, MKT, SMB, HML]`.
    ///
    /// Securities with fewer than `min_observations` overlapping days, or a
    /// singular design, are left out.
    pub fn estimate_betas(&self, returns: &ReturnSeries, panel: &DailyFactorPanel) -> Vec<SecurityBeta> {
        let mut betas = Vec::new();
        for (id, series) in returns {
            let rows: Vec<(f64, [f64; 3])> = series
                .iter()
                .filter(|(_, r)| r.is_finite())
                .filter_map(|(date, r)| panel.get(*date).map(|f| (r - f.rf, f.regressors())))
                .collect();

            if rows.len() < self.config.min_observations {
                tracing::debug!(security = %id, observations = rows.len(), "too few overlapping days");
                continue;
            }

            let y: Array1<f64> = rows.iter().map(|(r, _)| *r).collect();
            let x = Array2::from_shape_fn((rows.len(), 3), |(i, j)| rows[i].1[j]);

            match ols(&y, &with_intercept(&x)) {
                Ok(fit) => betas.push(SecurityBeta {
                    id: id.clone(),
                    alpha: fit.coefficients[0],
                    beta_market: fit.coefficients[1],
                    beta_smb: fit.coefficients[2],
                    beta_hml: fit.coefficients[3],
                    r_squared: fit.r_squared,
                    observations: rows.len(),
                }),
                Err(e) => tracing::debug!(security = %id, error = %e, "beta estimation failed"),
            }
        }

        tracing::info!(securities = betas.len(), candidates = returns.len(), "stage one complete");
        betas
    }

    /// Stage two: for each panel date, regress the cross-section of excess
    /// returns on `[1, beta_MKT, beta_SMB, beta_HML]`.
    ///
    /// Dates with fewer than `min_cross_section` securities, or a singular
    /// design, are left out.
    pub fn cross_sections(
        &self,
        returns: &ReturnSeries,
        panel: &DailyFactorPanel,
        betas: &[SecurityBeta],
    ) -> Vec<PeriodGamma> {
        let lookup: Vec<(&SecurityBeta, BTreeMap<NaiveDate, f64>)> = betas
            .iter()
            .filter_map(|beta| {
                let series = returns.get(&beta.id)?;
                Some((beta, series.iter().copied().filter(|(_, r)| r.is_finite()).collect()))
            })
            .collect();

        let dates: BTreeSet<NaiveDate> = panel.iter().map(|(d, _)| d).collect();
        let mut gammas = Vec::new();

        for date in dates {
            let Some(factors) = panel.get(date) else {
                continue;
            };
            let rows: Vec<(f64, [f64; 3])> = lookup
                .iter()
                .filter_map(|(beta, series)| series.get(&date).map(|r| (r - factors.rf, beta.loadings())))
                .collect();

            if rows.len() < self.config.min_cross_section {
                continue;
            }

            let y: Array1<f64> = rows.iter().map(|(r, _)| *r).collect();
            let x = Array2::from_shape_fn((rows.len(), 3), |(i, j)| rows[i].1[j]);

            match ols(&y, &with_intercept(&x)) {
                Ok(fit) => gammas.push(PeriodGamma {
                    date,
                    gamma_0: fit.coefficients[0],
                    gamma_market: fit.coefficients[1],
                    gamma_smb: fit.coefficients[2],
                    gamma_hml: fit.coefficients[3],
                    securities: rows.len(),
                }),
                Err(e) => tracing::debug!(%date, error = %e, "cross-section failed"),
            }
        }

        tracing::info!(periods = gammas.len(), "stage two complete");
        gammas
    }

    /// Average each factor's gamma series and t-test it against zero.
    ///
    /// # Errors
    /// Returns `InsufficientData` for fewer than two periods.
    pub fn premia(&self, gammas: &[PeriodGamma]) -> Result<Vec<FactorPremium>> {
        PricedFactor::ALL
            .into_iter()
            .map(|factor| {
                let series: Vec<f64> = gammas.iter().map(|g| g.gamma(factor)).collect();
                let test = TTest::mean_zero(&series)?;
                Ok(FactorPremium {
                    factor,
                    mean: test.mean,
                    annualized: test.mean * self.config.periods_per_year,
                    test,
                })
            })
            .collect()
    }

    /// Run both stages and the premium tests.
    ///
    /// # Errors
    /// Returns `InsufficientData` when no security survives stage one or
    /// fewer than two dates survive stage two.
    pub fn run(&self, returns: &ReturnSeries, panel: &DailyFactorPanel) -> Result<FamaMacBethResult> {
        if panel.is_empty() || returns.is_empty() {
            return Err(PremiaError::EmptyData);
        }

        let betas = self.estimate_betas(returns, panel);
        if betas.is_empty() {
            return Err(PremiaError::InsufficientData {
                stage: "stage one securities",
                required: 1,
                actual: 0,
            });
        }

        let gammas = self.cross_sections(returns, panel, &betas);
        if gammas.len() < 2 {
            return Err(PremiaError::InsufficientData {
                stage: "stage two periods",
                required: 2,
                actual: gammas.len(),
            });
        }

        let premia = self.premia(&gammas)?;
        for premium in &premia {
            tracing::info!(
                factor = %premium.factor,
                mean = premium.mean,
                annualized = premium.annualized,
                t_stat = premium.test.t_stat,
                p_value = premium.test.p_value,
                "factor premium"
            );
        }

        Ok(FamaMacBethResult {
            betas,
            gammas,
            premia,
        })
    }
}
