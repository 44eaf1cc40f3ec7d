//! Error types for beir-audit.

use beir_core::errors::TrailError;
use beir_schema::{ParameterError, SchemaError};

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Execution log not found: {0}")]
    MissingLog(String),

    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Trail(#[from] TrailError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
