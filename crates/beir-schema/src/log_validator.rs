//! Structural validation of execution logs.
//!
//! Every tagged line must carry a JSON payload matching the schema registered
//! for its tag. Lines without a tag are counted but not checked.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use beir_core::trail::locate_tag;
use serde::Serialize;

use crate::error::SchemaError;
use crate::registry::{SchemaRegistry, check, schema_name_for_tag};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogValidationError {
    pub line: usize,
    pub tag: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LogValidationReport {
    pub lines_checked: usize,
    pub events_checked: usize,
    pub errors: Vec<LogValidationError>,
}

impl LogValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every tagged line of the log at `path`.
///
/// # Errors
///
/// Returns `SchemaError::Io` when the log cannot be read and
/// `SchemaError::Generation` if a payload schema fails to compile.
pub fn validate_execution_log(path: &Path) -> Result<LogValidationReport, SchemaError> {
    let content = fs::read_to_string(path)?;
    let registry = SchemaRegistry::new();
    let mut validators = HashMap::new();
    let mut report = LogValidationReport::default();

    for (line_idx, line) in content.lines().enumerate() {
        let line_no = line_idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        report.lines_checked += 1;

        let Some((tag, payload)) = locate_tag(line) else {
            continue;
        };
        report.events_checked += 1;

        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(error) => {
                report.errors.push(LogValidationError {
                    line: line_no,
                    tag: tag.to_string(),
                    message: format!("invalid JSON: {error}"),
                });
                continue;
            }
        };

        let Some(name) = schema_name_for_tag(tag) else {
            continue;
        };
        let validator = match validators.entry(name) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(registry.compile(name)?)
            }
        };

        if let Err(SchemaError::ValidationFailed { errors }) = check(validator, &value) {
            report.errors.push(LogValidationError {
                line: line_no,
                tag: tag.to_string(),
                message: format!("schema validation failed: {}", errors.join("; ")),
            });
        }
    }

    tracing::debug!(
        path = %path.display(),
        events = report.events_checked,
        errors = report.errors.len(),
        "validated execution log"
    );
    Ok(report)
}
