//! Error types for beir-hotspot.

use beir_core::errors::{CoreError, TrailError};

/// Errors raised while extracting HotSpot reports.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Input directory not found: {0}")]
    MissingInput(String),

    #[error("Pattern compile failed for {field}: {source}")]
    Pattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The first line of a data block had fewer than six columns.
    #[error("Malformed data line {line} in {file}: expected 6 columns, found {found}")]
    MalformedBlock {
        file: String,
        line: usize,
        found: usize,
    },

    #[error(transparent)]
    Csv(#[from] CoreError),

    #[error(transparent)]
    Trail(#[from] TrailError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while pivoting the extraction CSV.
#[derive(Debug, thiserror::Error)]
pub enum TransposeError {
    #[error("Extraction CSV not found: {0}")]
    MissingInput(String),

    #[error("Extraction CSV lacks required column '{0}'")]
    MissingColumn(&'static str),

    /// Two rows report a dose for the same organ and scenario.
    #[error("Duplicate observation for {organ} at {scenario}")]
    Duplicate { organ: String, scenario: String },

    #[error(transparent)]
    Csv(#[from] CoreError),

    #[error(transparent)]
    Trail(#[from] TrailError),
}
