//! # beir-audit
//!
//! Independent verification of a risk computation run.
//!
//! - [`ShadowAuditor`] replays every computed `CALC_LOG` entry of an execution
//!   log against the raw parameter document, using its own formulas and
//!   defaults, and returns one [`EntryVerdict`] per entry.
//! - [`render`] writes the Markdown report and the JSONL verdict export.
//! - [`ValidationSummary`] condenses a log into integrity hashes, counts, and
//!   the skipped-cell table.
//!
//! The auditor shares no parameter model with `beir-engine`; only the log
//! envelope types from `beir-core` are common.

mod auditor;
mod error;
mod reference;
pub mod render;
mod shadow;
mod summary;
mod verdict;

use std::path::Path;

pub use auditor::ShadowAuditor;
pub use error::AuditError;
pub use reference::{OrganRef, Reference};
pub use shadow::Recalculation;
pub use summary::{SkippedItem, ValidationSummary};
pub use verdict::{
    ABSOLUTE_TOLERANCE, AuditReport, AuditSummary, Category, EntryVerdict, Failure,
    RELATIVE_TOLERANCE, Status,
};

/// Where an audit writes its artifacts.
#[derive(Debug, Clone, Copy)]
pub struct AuditOutputs<'a> {
    pub report: &'a Path,
    pub verdicts: &'a Path,
}

/// Audit `log` against `params` and write both artifacts.
///
/// # Errors
///
/// Returns `AuditError` when the parameter document or the log cannot be
/// read, or an artifact cannot be written.
pub fn audit_run(log: &Path, params: &Path, outputs: AuditOutputs<'_>) -> Result<AuditReport, AuditError> {
    let auditor = ShadowAuditor::new(Reference::load(params)?)?;
    let report = auditor.audit_log(log)?;
    let source = log
        .file_name()
        .map_or_else(|| log.display().to_string(), |n| n.to_string_lossy().into_owned());
    render::write_report(&report, &source, outputs.report)?;
    render::write_verdicts(&report, outputs.verdicts)?;
    Ok(report)
}
