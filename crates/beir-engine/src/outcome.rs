//! Per-cell results.

use beir_core::enums::ModelName;
use beir_core::numeric::format_fixed;
use beir_core::trail::CalcParams;

use crate::error::SolverError;

/// Flag recorded for cells whose BEIR V model type is not recognised.
pub const UNKNOWN_MODEL_FLAG: &str = "UNKNOWN_MODEL";

/// Raw solver output for one dose.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub err: f64,
    /// Symbolic equation as evaluated, echoed into the audit trail.
    pub equation: String,
    /// Every coefficient the solver used.
    pub params: CalcParams,
    pub flag: Option<&'static str>,
}

/// A computed cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub model: ModelName,
    pub err: f64,
    pub lar: f64,
    pub baseline: f64,
    pub equation: String,
    pub params: CalcParams,
    pub flag: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// Dose at or above the safety ceiling; nothing was computed.
    DoseCeiling { dose_msv: f64 },
    /// The organ's BEIR VII beta is undefined for this sex.
    NotApplicableToSex,
}

impl SkipReason {
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::DoseCeiling { .. } => "dose above the 4000 mSv safety ceiling",
            Self::NotApplicableToSex => {
                "biological model not applicable to this sex (beta coefficient undefined)"
            }
        }
    }

    /// `%.2f` dose for ceiling skips.
    #[must_use]
    pub fn measured_msv(&self) -> Option<String> {
        match self {
            Self::DoseCeiling { dose_msv } => Some(format_fixed(*dose_msv, 2)),
            Self::NotApplicableToSex => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    Computed(Evaluation),
    Skipped(SkipReason),
    Failed {
        model: ModelName,
        error: SolverError,
        params: CalcParams,
    },
}

impl CellOutcome {
    /// Model shown for the cell, `None` for skipped cells.
    #[must_use]
    pub const fn model(&self) -> Option<ModelName> {
        match self {
            Self::Computed(evaluation) => Some(evaluation.model),
            Self::Failed { model, .. } => Some(*model),
            Self::Skipped(_) => None,
        }
    }

    #[must_use]
    pub const fn is_ceiling_skip(&self) -> bool {
        matches!(self, Self::Skipped(SkipReason::DoseCeiling { .. }))
    }
}
