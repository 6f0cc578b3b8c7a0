//! Fama-MacBeth result tables and the premia summary.

use crate::export::{ExportFormat, Exporter, Result};
use busan_premia::{FamaMacBethResult, SecurityBeta};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Stage-one betas file name.
pub const BETAS_FILE: &str = "stage1_betas.csv";
/// Stage-two gammas file name.
pub const GAMMAS_FILE: &str = "stage2_gammas.csv";
/// Text summary file name.
pub const SUMMARY_FILE: &str = "fama_macbeth_summary.txt";

/// One row of the stage-one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaRow {
    /// Company key
    pub gvkey: String,
    /// Issue id
    pub iid: String,
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
    /// Days used
    pub observations: usize,
}

impl From<&SecurityBeta> for BetaRow {
    fn from(beta: &SecurityBeta) -> Self {
        Self {
            gvkey: beta.id.gvkey.clone(),
            iid: beta.id.iid.clone(),
            alpha: beta.alpha,
            beta_market: beta.beta_market,
            beta_smb: beta.beta_smb,
            beta_hml: beta.beta_hml,
            r_squared: beta.r_squared,
            observations: beta.observations,
        }
    }
}

/// Render the text summary of a Fama-MacBeth run.
pub fn render_premia_summary(result: &FamaMacBethResult, start: NaiveDate, end: NaiveDate) -> String {
    let mut output = String::new();
    let rule = "=".repeat(80);

    output.push_str(&format!("{rule}\nKorea Fama-MacBeth Results\n{rule}\n\n"));
    output.push_str(&format!("Period: {start} to {end}\n"));
    output.push_str(&format!("Securities: {}\n", result.betas.len()));
    output.push_str(&format!("Cross-sections: {}\n\n", result.gammas.len()));

    output.push_str(&format!("{rule}\nFactor Premia\n{rule}\n\n"));
    output.push_str(&format!(
        "{:<20} {:>12} {:>12} {:>10} {:>10} {:>6}\n",
        "Factor", "Daily", "Annual", "t-stat", "p-value", "Sig"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for premium in &result.premia {
        output.push_str(&format!(
            "{:<20} {:>11.4}% {:>11.2}% {:>10.2} {:>10.4} {:>6}\n",
            premium.factor.name(),
            premium.mean * 100.0,
            premium.annualized * 100.0,
            premium.test.t_stat,
            premium.test.p_value,
            premium.test.significance().stars()
        ));
    }

    output.push_str("\nNote: *** p<0.01, ** p<0.05, * p<0.1\n");
    output
}

/// Paths written by [`write_premia`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremiaArtifacts {
    /// Stage-one table
    pub betas: PathBuf,
    /// Stage-two table
    pub gammas: PathBuf,
    /// Text summary
    pub summary: PathBuf,
}

/// Write the stage-one table, the stage-two table and the summary into `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file cannot be
/// written.
pub fn write_premia(
    result: &FamaMacBethResult,
    start: NaiveDate,
    end: NaiveDate,
    dir: &Path,
) -> Result<PremiaArtifacts> {
    fs::create_dir_all(dir)?;
    let artifacts = PremiaArtifacts {
        betas: dir.join(BETAS_FILE),
        gammas: dir.join(GAMMAS_FILE),
        summary: dir.join(SUMMARY_FILE),
    };

    let betas: Vec<BetaRow> = result.betas.iter().map(BetaRow::from).collect();
    betas.export_to_file(&artifacts.betas, ExportFormat::Csv)?;
    result.gammas.export_to_file(&artifacts.gammas, ExportFormat::Csv)?;
    fs::write(&artifacts.summary, render_premia_summary(result, start, end))?;

    tracing::info!(
        dir = %dir.display(),
        securities = betas.len(),
        periods = result.gammas.len(),
        "saved Fama-MacBeth results"
    );
    Ok(artifacts)
}
