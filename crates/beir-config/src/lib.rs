//! # beir-config
//!
//! Layered configuration loading for the dose-to-risk pipeline using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`BEIR_*` prefix, `__` as separator)
//! 2. Project-level `.beir/config.toml`
//! 3. User-level `~/.config/beir/config.toml`
//! 4. Built-in defaults
//!
//! Command-line flags are applied on top by `beir-cli`.
//!
//! # Environment Variable Mapping
//!
//! `BEIR_PIPELINE__PARAMS_FILE` -> `pipeline.params_file`,
//! `BEIR_FILTERS__SHOW_HIGH_DOSE` -> `filters.show_high_dose`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use beir_config::BeirConfig;
//!
//! let config = BeirConfig::load_with_dotenv().expect("config");
//! println!("parameters: {}", config.pipeline.params_file);
//! ```

mod error;
mod general;
mod pipeline;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use pipeline::PipelineConfig;

use beir_core::run::RunFilters;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for every configuration key.
pub const ENV_PREFIX: &str = "BEIR_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BeirConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub filters: RunFilters,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl BeirConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source fails to parse or a value
    /// has the wrong type, and `ConfigError::InvalidValue` for blank paths.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".beir/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Path to the user-global config file.
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("beir").join("config.toml"))
    }
}
