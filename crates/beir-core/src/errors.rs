//! Cross-cutting error types for the pipeline.
//!
//! Stage-specific errors (`ExtractError`, `EngineError`, `AuditError`, ...) are
//! defined in their respective crates. They converge into `anyhow` in `beir-cli`.

use thiserror::Error;

/// Errors raised while reading or writing the shared wire formats.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A delimited file did not match the expected layout.
    #[error("Malformed CSV {path} line {line}: {message}")]
    MalformedCsv {
        path: String,
        line: usize,
        message: String,
    },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised by the audit trail codec and sinks.
#[derive(Debug, Error)]
pub enum TrailError {
    /// A log line carried a known tag but its payload did not decode.
    #[error("Invalid {tag} payload on line {line}: {source}")]
    InvalidPayload {
        tag: &'static str,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode audit event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
