//! End-to-end run: extract → transpose → compute → summarise → audit.
//!
//! Stages exchange only files. Each stage must leave its artifact on disk
//! before the next one starts; a missing artifact aborts the run with an
//! I/O error naming the stage. One execution log sink is held for the whole
//! run so every stage writes to the same trail.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use beir_audit::{AuditOutputs, AuditSummary, ValidationSummary};
use beir_core::enums::ModelOverride;
use beir_core::run::{RunFilters, RunLayout, RunStamp};
use beir_core::sink::{AuditSink, FileAuditSink};
use beir_engine::{Ages, RiskRequest, RiskSummary};
use beir_hotspot::Extractor;

use crate::progress::Progress;

/// Inputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub params: PathBuf,
    pub ages: Ages,
    pub model_override: ModelOverride,
    pub filters: RunFilters,
    pub stamp: RunStamp,
    pub run_audit: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub layout: RunLayout,
    pub extracted: usize,
    pub organs: usize,
    pub scenarios: usize,
    pub risk: RiskSummary,
    pub audit: Option<AuditSummary>,
}

pub struct Pipeline;

impl Pipeline {
    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Fails on invalid parameters, on any stage error, and when a stage
    /// did not produce its expected file.
    pub fn run(request: &PipelineRequest) -> anyhow::Result<PipelineOutcome> {
        let layout = RunLayout::new(
            &request.output_dir,
            request.ages.exposure,
            request.ages.attained,
            request.stamp,
        );
        std::fs::create_dir_all(layout.dir()).with_context(|| {
            format!("failed to create output directory {}", layout.dir().display())
        })?;

        let progress = Progress::spinner("validating risk parameters");
        let params = beir_schema::load_risk_parameters(&request.params)
            .context("parameter validation failed")?;
        tracing::debug!(organs = params.configurations.len(), "risk parameters valid");

        let mut sink = FileAuditSink::create(&layout.execution_log())
            .context("failed to open the execution log")?;
        let result = Self::stages(request, &layout, &mut sink, &progress);
        sink.flush().context("failed to flush the execution log")?;
        drop(sink);

        match result {
            Ok(outcome) => {
                progress.finish_ok("pipeline finished");
                Ok(outcome)
            }
            Err(e) => {
                progress.finish_err("pipeline aborted");
                Err(e)
            }
        }
    }

    fn stages(
        request: &PipelineRequest,
        layout: &RunLayout,
        sink: &mut FileAuditSink,
        progress: &Progress,
    ) -> anyhow::Result<PipelineOutcome> {
        progress.set_message("extracting HotSpot reports");
        let extraction = layout.extraction_csv();
        let extracted = Extractor::new()
            .context("failed to build the report extractor")?
            .extract_dir(&request.input_dir, &extraction, sink)
            .context("extraction failed")?;
        require_artifact("extraction", &extraction)?;

        progress.set_message("transposing the dose matrix");
        let transposed = layout.transposed_csv();
        let matrix = beir_hotspot::transpose(&extraction, &transposed, sink)
            .context("transposition failed")?;
        require_artifact("transposition", &transposed)?;

        progress.set_message("computing risk");
        let risk = beir_engine::run(
            &RiskRequest {
                dose_matrix: transposed,
                params_file: request.params.clone(),
                output_csv: layout.risk_csv(),
                ages: request.ages,
                model_override: request.model_override,
                filters: request.filters.clone(),
                stamp: request.stamp,
            },
            sink,
        )
        .context("risk computation failed")?;
        require_artifact("risk computation", &risk.output)?;
        sink.flush().context("failed to flush the execution log")?;

        progress.set_message("writing the validation summary");
        ValidationSummary::from_log(&layout.execution_log())
            .and_then(|summary| summary.write(&layout.validation_summary()))
            .context("validation summary failed")?;

        let audit = if request.run_audit {
            progress.set_message("running the shadow audit");
            let report = beir_audit::audit_run(
                &layout.execution_log(),
                &request.params,
                AuditOutputs {
                    report: &layout.audit_report(),
                    verdicts: &layout.audit_verdicts(),
                },
            )
            .context("shadow audit failed")?;
            if !report.summary.passed() {
                tracing::warn!(
                    rejected = report.summary.rejected,
                    "shadow audit rejected logged calculations"
                );
            }
            Some(report.summary)
        } else {
            None
        };

        Ok(PipelineOutcome {
            layout: layout.clone(),
            extracted,
            organs: matrix.rows.len(),
            scenarios: matrix.scenarios.len(),
            risk,
            audit,
        })
    }
}

fn require_artifact(stage: &str, path: &Path) -> anyhow::Result<()> {
    if path.is_file() {
        return Ok(());
    }
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{stage} did not produce {}", path.display()),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_names_the_stage() {
        let dir = tempfile::tempdir().unwrap();
        let err = require_artifact("transposition", &dir.path().join("absent.csv")).unwrap_err();
        assert!(err.to_string().starts_with("transposition did not produce"));
        assert!(err.downcast_ref::<io::Error>().is_some());
    }
}
