//! Error types for beir-engine.

use beir_core::errors::{CoreError, TrailError};
use beir_schema::ParameterError;

/// Fatal errors of a risk computation run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Dose matrix not found: {0}")]
    MissingInput(String),

    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Trail(#[from] TrailError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Short error class name written to `CRITICAL_FAILURE` events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "MissingInput",
            Self::Parameters(_) => "ParameterError",
            Self::Core(_) => "CoreError",
            Self::Trail(_) => "TrailError",
            Self::Io(_) => "IoError",
        }
    }
}

/// Per-cell numeric failure. Recorded in the cell outcome, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolverError {
    #[error("coefficient '{0}' is not defined")]
    MissingCoefficient(&'static str),

    #[error("non-finite result: {0}")]
    NonFinite(String),
}
