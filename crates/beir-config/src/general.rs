//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_log_filter() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// `tracing` filter used when `BEIR_LOG` is unset and no verbosity flag is given.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Suppress progress spinners on stderr.
    #[serde(default)]
    pub quiet_progress: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            quiet_progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.log_filter, "warn");
        assert!(!config.quiet_progress);
    }
}
