//! Environment configuration.
//!
//! Values come from the process environment, after loading a `.env` file when
//! one is present.

use busan_data::DEFAULT_MARKET;
use busan_factors::SynthesizerConfig;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::integration::store_manager::default_store_path;

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// A required variable is not set
    #[error("{key} is not set: {hint}")]
    Missing { key: &'static str, hint: &'static str },

    /// A variable could not be parsed
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    /// SQLite store location (`BUSAN_DB_PATH`)
    pub(crate) db_path: PathBuf,
    /// Market code (`BUSAN_MARKET`)
    pub(crate) market: String,
    /// Fallback annual risk-free rate as a decimal (`BUSAN_RISK_FREE_ANNUAL`)
    pub(crate) risk_free_annual: f64,
    /// Minimum eligible universe per month (`BUSAN_MIN_UNIVERSE`)
    pub(crate) min_universe: usize,
    /// Calendar days searched back for a trading day (`BUSAN_MAX_DAYS_BACK`)
    pub(crate) max_days_back: u32,
    /// ECOS statistics API key (`ECOS_API_KEY`)
    pub(crate) ecos_api_key: Option<String>,
}

impl AppConfig {
    /// Load `.env` and read the process environment.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = SynthesizerConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            db_path: non_empty("BUSAN_DB_PATH").map_or_else(default_store_path, PathBuf::from),
            market: non_empty("BUSAN_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
            risk_free_annual: parse(&lookup, "BUSAN_RISK_FREE_ANNUAL", 0.01)?,
            min_universe: parse(&lookup, "BUSAN_MIN_UNIVERSE", defaults.min_universe)?,
            max_days_back: parse(&lookup, "BUSAN_MAX_DAYS_BACK", defaults.max_days_back)?,
            ecos_api_key: non_empty("ECOS_API_KEY"),
        })
    }

    /// The ECOS key, for commands that fetch rates.
    pub(crate) fn require_ecos_key(&self) -> Result<&str, ConfigError> {
        self.ecos_api_key.as_deref().ok_or(ConfigError::Missing {
            key: "ECOS_API_KEY",
            hint: "set it in the environment or .env, or pass --api-key",
        })
    }

    /// Synthesizer settings from this configuration.
    pub(crate) fn synthesizer_config(&self) -> SynthesizerConfig {
        SynthesizerConfig {
            min_universe: self.min_universe,
            max_days_back: self.max_days_back,
            ..Default::default()
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
