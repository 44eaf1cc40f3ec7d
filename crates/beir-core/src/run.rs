//! Run identity, artifact layout, and output filters.
//!
//! Every artifact of a run is named from the run stamp and the truncated ages:
//!
//! ```text
//! 1_hotspot_extract_ee{E}_ea{A}_{RUN}.csv
//! 2_hotspot_transpose_ee{E}_ea{A}_{RUN}.csv
//! 3_calculated_risks_ERR_LAR_ee{E}_ea{A}_{RUN}.csv
//! 4_execution_log_ee{E}_ea{A}_{RUN}.log
//! 5_validation_summary_ee{E}_ea{A}_{RUN}.md
//! 6_shadow_audit_ee{E}_ea{A}_{RUN}.md / .jsonl
//! ```

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Metric, Sex};
use crate::errors::CoreError;

const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// RunStamp
// ---------------------------------------------------------------------------

/// Caller-supplied run identity. Reusing a stamp reproduces artifact names
/// and log timestamps exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunStamp(NaiveDateTime);

impl RunStamp {
    /// Stamp for the current local time.
    #[must_use]
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    /// Parse a `YYYYMMDDHHMMSS` identifier.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` when the text is not a valid stamp.
    pub fn from_id(id: &str) -> Result<Self, CoreError> {
        NaiveDateTime::parse_from_str(id.trim(), STAMP_FORMAT)
            .map(Self)
            .map_err(|e| CoreError::Validation(format!("invalid run id '{id}': {e}")))
    }

    /// `YYYYMMDDHHMMSS` identifier.
    #[must_use]
    pub fn id(&self) -> String {
        self.0.format(STAMP_FORMAT).to_string()
    }

    /// ISO 8601 timestamp (seconds precision, no offset).
    #[must_use]
    pub fn iso(&self) -> String {
        self.0.format(ISO_FORMAT).to_string()
    }
}

// ---------------------------------------------------------------------------
// RunLayout
// ---------------------------------------------------------------------------

/// Artifact paths of one run inside its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    dir: PathBuf,
    suffix: String,
}

impl RunLayout {
    /// Ages are truncated toward zero for naming.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(dir: impl Into<PathBuf>, exposure_age: f64, attained_age: f64, stamp: RunStamp) -> Self {
        Self {
            dir: dir.into(),
            suffix: format!(
                "ee{}_ea{}_{}",
                exposure_age.trunc() as i64,
                attained_age.trunc() as i64,
                stamp.id()
            ),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, prefix: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{prefix}_{}.{ext}", self.suffix))
    }

    #[must_use]
    pub fn extraction_csv(&self) -> PathBuf {
        self.file("1_hotspot_extract", "csv")
    }

    #[must_use]
    pub fn transposed_csv(&self) -> PathBuf {
        self.file("2_hotspot_transpose", "csv")
    }

    #[must_use]
    pub fn risk_csv(&self) -> PathBuf {
        self.file("3_calculated_risks_ERR_LAR", "csv")
    }

    #[must_use]
    pub fn execution_log(&self) -> PathBuf {
        self.file("4_execution_log", "log")
    }

    #[must_use]
    pub fn validation_summary(&self) -> PathBuf {
        self.file("5_validation_summary", "md")
    }

    #[must_use]
    pub fn audit_report(&self) -> PathBuf {
        self.file("6_shadow_audit", "md")
    }

    #[must_use]
    pub fn audit_verdicts(&self) -> PathBuf {
        self.file("6_shadow_audit", "jsonl")
    }
}

// ---------------------------------------------------------------------------
// RunFilters
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

fn default_sexes() -> Vec<Sex> {
    Sex::ALL.to_vec()
}

fn default_metrics() -> Vec<Metric> {
    Metric::ALL.to_vec()
}

/// Output selection of a run. Filters only decide what is evaluated and
/// written; they never change a computed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunFilters {
    /// Keep scenarios whose every cell exceeded the dose ceiling.
    #[serde(default = "default_true")]
    pub show_high_dose: bool,
    #[serde(default = "default_sexes")]
    pub sexes: Vec<Sex>,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<Metric>,
    /// `None` or an empty list selects every organ.
    #[serde(default)]
    pub organs: Option<Vec<String>>,
}

impl Default for RunFilters {
    fn default() -> Self {
        Self {
            show_high_dose: true,
            sexes: default_sexes(),
            metrics: default_metrics(),
            organs: None,
        }
    }
}

impl RunFilters {
    /// Selected sexes in evaluation order (males first).
    #[must_use]
    pub fn sexes_in_order(&self) -> Vec<Sex> {
        Sex::ALL
            .into_iter()
            .filter(|s| self.sexes.contains(s))
            .collect()
    }

    #[must_use]
    pub fn includes_metric(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }

    #[must_use]
    pub fn includes_organ(&self, organ: &str) -> bool {
        match &self.organs {
            None => true,
            Some(list) if list.is_empty() => true,
            Some(list) => list.iter().any(|o| o == organ),
        }
    }
}
