//! Fail-fast loading of the risk parameter document.
//!
//! Read → parse JSON → validate against [`RISK_PARAMETERS`] → decode. No
//! computation may start unless all four steps succeed.

use std::path::Path;

use beir_core::params::RiskParameterSet;
use serde_json::Value;

use crate::error::{ParameterError, SchemaError};
use crate::registry::{RISK_PARAMETERS, SchemaRegistry};

/// Validate an already-parsed document.
///
/// # Errors
///
/// Returns `ParameterError::Schema` with every violation message.
pub fn validate_risk_parameters(document: &Value, path: &Path) -> Result<(), ParameterError> {
    match SchemaRegistry::new().validate(RISK_PARAMETERS, document) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "parameter document passed schema validation");
            Ok(())
        }
        Err(SchemaError::ValidationFailed { errors }) => {
            tracing::error!(path = %path.display(), count = errors.len(), "parameter document failed schema validation");
            Err(ParameterError::Schema {
                path: path.to_path_buf(),
                errors,
            })
        }
        Err(other) => Err(other.into()),
    }
}

/// Read and schema-validate the document, returning it as raw JSON.
///
/// Used by consumers that must not share the typed model (the shadow auditor).
///
/// # Errors
///
/// Returns `ParameterError::Io`, `ParameterError::Json`, or
/// `ParameterError::Schema`.
pub fn read_parameter_document(path: &Path) -> Result<Value, ParameterError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParameterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&text).map_err(|source| ParameterError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    validate_risk_parameters(&document, path)?;
    Ok(document)
}

/// Load the typed parameter set.
///
/// # Errors
///
/// Any [`read_parameter_document`] error, or `ParameterError::Decode` when a
/// schema-valid document does not map onto the typed model.
pub fn load_risk_parameters(path: &Path) -> Result<RiskParameterSet, ParameterError> {
    let document = read_parameter_document(path)?;
    let set: RiskParameterSet =
        serde_json::from_value(document).map_err(|source| ParameterError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(
        path = %path.display(),
        organs = set.configurations.len(),
        version = set.version().unwrap_or("unversioned"),
        "loaded risk parameters"
    );
    Ok(set)
}
