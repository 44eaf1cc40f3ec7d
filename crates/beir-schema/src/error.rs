//! Schema validation error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the schema registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Requested schema name was not found in the registry.
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// JSON value did not pass schema validation.
    #[error("Validation failed: {errors:?}")]
    ValidationFailed {
        /// Individual error messages from the validator.
        errors: Vec<String>,
    },

    /// Schema compilation error.
    #[error("Schema compilation error: {0}")]
    Generation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors loading the risk parameter document. All of them are fatal for a run.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("Cannot read parameter file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parameter file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document violates the `risk_parameters` schema.
    #[error("Parameter file {path} failed schema validation:\n  - {}", errors.join("\n  - "))]
    Schema { path: PathBuf, errors: Vec<String> },

    /// Schema-valid but not representable in the typed model.
    #[error("Parameter file {path} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Registry(#[from] SchemaError),
}
