//! Pipeline locations and model policy.

use std::path::PathBuf;

use beir_core::enums::ModelOverride;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_params_file() -> String {
    "data/risk_parameters.json".to_string()
}

fn default_output_root() -> String {
    "output".to_string()
}

const fn default_run_audit() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Risk parameter document used when `--params` is not given.
    #[serde(default = "default_params_file")]
    pub params_file: String,

    /// Directory under which each run creates its output folder.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Run-wide model policy (`auto`, `vii`, `v`).
    #[serde(default)]
    pub model_override: ModelOverride,

    /// Whether the shadow audit runs after the risk computation.
    #[serde(default = "default_run_audit")]
    pub run_audit: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            params_file: default_params_file(),
            output_root: default_output_root(),
            model_override: ModelOverride::default(),
            run_audit: default_run_audit(),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn params_path(&self) -> PathBuf {
        PathBuf::from(&self.params_file)
    }

    #[must_use]
    pub fn output_root_path(&self) -> PathBuf {
        PathBuf::from(&self.output_root)
    }

    /// Reject values that would only fail later, deep inside a run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for blank paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.params_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.params_file".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.output_root.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.output_root".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = PipelineConfig::default();
        assert_eq!(config.params_file, "data/risk_parameters.json");
        assert_eq!(config.output_root, "output");
        assert_eq!(config.model_override, ModelOverride::Auto);
        assert!(config.run_audit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_params_file_is_invalid() {
        let config = PipelineConfig {
            params_file: "  ".into(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "pipeline.params_file"
        ));
    }
}
