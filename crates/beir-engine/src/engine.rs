//! Run driver: header, per-cell evaluation, result CSV, footer.

use std::path::PathBuf;

use beir_core::dose_matrix::{DoseMatrix, DoseRow};
use beir_core::enums::{ModelOverride, Sex};
use beir_core::errors::CoreError;
use beir_core::numeric::{SciValue, format_fixed, format_scientific};
use beir_core::run::{RunFilters, RunStamp};
use beir_core::sink::AuditSink;
use beir_core::trail::{
    AuditEvent, CalcLog, ComputedCalc, ConfigWarning, CriticalFailure, EVENT_END, EVENT_FAILURE,
    EVENT_START, ExecutionFooter, ExecutionHeader, NOT_AVAILABLE, RunConfiguration, SkipStatus,
    SkippedCalc,
};

use crate::ages::Ages;
use crate::dispatch::evaluate_cell;
use crate::error::EngineError;
use crate::integrity;
use crate::outcome::CellOutcome;
use crate::report::{RiskRow, RiskTable};

const STATUS_SUCCESS: &str = "SUCCESS";

/// Everything a computation run needs.
#[derive(Debug, Clone)]
pub struct RiskRequest {
    /// Transposed dose matrix (`2_hotspot_transpose_*.csv`).
    pub dose_matrix: PathBuf,
    pub params_file: PathBuf,
    /// Result CSV to write.
    pub output_csv: PathBuf,
    pub ages: Ages,
    pub model_override: ModelOverride,
    pub filters: RunFilters,
    pub stamp: RunStamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskSummary {
    pub output: PathBuf,
    /// Rows in the result CSV.
    pub rows: usize,
    pub computed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Scenario columns removed by high-dose suppression.
    pub suppressed: Vec<String>,
}

/// Run the risk computation, recording every step through `sink`.
///
/// The header is always written. Any fatal error after it is recorded as a
/// `CRITICAL_FAILURE` event before being returned.
///
/// # Errors
///
/// Returns `EngineError::MissingInput` when the dose matrix does not exist,
/// a parameter error when the document is invalid, and I/O or trail errors.
pub fn run(request: &RiskRequest, sink: &mut dyn AuditSink) -> Result<RiskSummary, EngineError> {
    sink.record(&AuditEvent::Header(header(request)))?;

    match evaluate(request, sink) {
        Ok(summary) => {
            sink.record(&AuditEvent::Footer(ExecutionFooter {
                event: EVENT_END.into(),
                status: STATUS_SUCCESS.into(),
                output: summary.output.display().to_string(),
                rows: summary.rows,
                computed: summary.computed,
                skipped: summary.skipped,
                failed: summary.failed,
            }))?;
            sink.flush()?;
            tracing::info!(
                output = %summary.output.display(),
                rows = summary.rows,
                computed = summary.computed,
                skipped = summary.skipped,
                failed = summary.failed,
                "risk computation finished"
            );
            Ok(summary)
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), "risk computation failed: {e}");
            sink.record(&AuditEvent::CriticalFailure(CriticalFailure {
                event: EVENT_FAILURE.into(),
                timestamp: request.stamp.iso(),
                error_type: e.kind().into(),
                error_message: e.to_string(),
            }))?;
            sink.flush()?;
            Err(e)
        }
    }
}

fn header(request: &RiskRequest) -> ExecutionHeader {
    ExecutionHeader {
        event: EVENT_START.into(),
        run_id: request.stamp.id(),
        timestamp: request.stamp.iso(),
        environment: integrity::environment(),
        inputs: integrity::inputs_integrity(&request.dose_matrix, &request.params_file),
        configuration: RunConfiguration {
            exposure_age: request.ages.exposure,
            attained_age: request.ages.attained,
            model_override: request.model_override,
            filters: request.filters.clone(),
        },
    }
}

#[derive(Default)]
struct Counts {
    computed: usize,
    skipped: usize,
    failed: usize,
}

fn evaluate(request: &RiskRequest, sink: &mut dyn AuditSink) -> Result<RiskSummary, EngineError> {
    if !request.dose_matrix.is_file() {
        return Err(EngineError::MissingInput(
            request.dose_matrix.display().to_string(),
        ));
    }
    let params = beir_schema::load_risk_parameters(&request.params_file)?;
    let matrix = DoseMatrix::read(&request.dose_matrix)?;
    tracing::debug!(
        organs = matrix.rows.len(),
        scenarios = matrix.scenarios.len(),
        version = params.version().unwrap_or("unversioned"),
        "dose matrix loaded"
    );

    let mut table = RiskTable::new(matrix.scenarios.clone());
    let mut counts = Counts::default();

    for sex in request.filters.sexes_in_order() {
        for row in matrix
            .rows
            .iter()
            .filter(|r| request.filters.includes_organ(&r.organ))
        {
            let Some(organ) = params.organ(&row.organ) else {
                warn_missing_organ(sink, sex, row)?;
                continue;
            };
            let mut cells = Vec::with_capacity(matrix.scenarios.len());
            for (scenario, dose) in matrix.scenarios.iter().zip(&row.doses) {
                let dose_sv = dose.filter(|d| !d.is_nan()).unwrap_or(0.0);
                let outcome =
                    evaluate_cell(organ, sex, dose_sv, request.ages, request.model_override);
                let context = format!("{}|{}|{scenario}", sex.label(), row.organ);
                sink.record(&AuditEvent::Calc(calc_log(
                    row.row_id, context, dose_sv, &outcome,
                )))?;
                match outcome {
                    CellOutcome::Computed(_) => counts.computed += 1,
                    CellOutcome::Skipped(_) => counts.skipped += 1,
                    CellOutcome::Failed { .. } => counts.failed += 1,
                }
                cells.push((dose_sv, outcome));
            }
            table.push(RiskRow {
                row_id: row.row_id,
                sex,
                organ: row.organ.clone(),
                equivalence: organ
                    .beir_vii_equivalence
                    .clone()
                    .unwrap_or_else(|| row.organ.clone()),
                cells,
            });
        }
    }

    let output = table.to_table(request.ages, &request.filters);
    if let Some(parent) = request.output_csv.parent() {
        std::fs::create_dir_all(parent).map_err(CoreError::from)?;
    }
    output.write(&request.output_csv)?;

    Ok(RiskSummary {
        output: request.output_csv.clone(),
        rows: output.rows.len(),
        computed: counts.computed,
        skipped: counts.skipped,
        failed: counts.failed,
        suppressed: if request.filters.show_high_dose {
            Vec::new()
        } else {
            table.saturated().into_iter().map(String::from).collect()
        },
    })
}

fn warn_missing_organ(sink: &mut dyn AuditSink, sex: Sex, row: &DoseRow) -> Result<(), EngineError> {
    tracing::warn!(organ = %row.organ, %sex, "organ missing from risk parameters, row skipped");
    sink.record(&AuditEvent::ConfigWarning(ConfigWarning {
        row_id: row.row_id,
        context: format!("{}|{}", sex.label(), row.organ),
        status: SkipStatus::Skipped,
        reason: "organ not found in the risk parameter file".into(),
        action: "calculation row skipped".into(),
    }))?;
    Ok(())
}

fn calc_log(row_id: u64, context: String, dose_sv: f64, outcome: &CellOutcome) -> CalcLog {
    let dose_msv = dose_sv * 1000.0;
    match outcome {
        CellOutcome::Skipped(reason) => CalcLog::Skipped(SkippedCalc {
            row_id,
            context,
            status: SkipStatus::Skipped,
            reason: reason.message().into(),
            dose_measured_msv: reason.measured_msv(),
            result_err: NOT_AVAILABLE.into(),
            result_lar: NOT_AVAILABLE.into(),
        }),
        CellOutcome::Computed(eval) => CalcLog::Computed(ComputedCalc {
            row_id,
            context,
            dose_sv: SciValue(dose_sv),
            dose_msv: format_fixed(dose_msv, 2),
            model: eval.model,
            result_err: SciValue(eval.err),
            result_lar: SciValue(eval.lar),
            equation: eval.equation.clone(),
            baseline_incidence: format_scientific(eval.baseline, 2),
            params: eval.params.clone(),
            flag: eval.flag.map(String::from),
            error: None,
        }),
        CellOutcome::Failed {
            model,
            error,
            params,
        } => CalcLog::Computed(ComputedCalc {
            row_id,
            context,
            dose_sv: SciValue(dose_sv),
            dose_msv: format_fixed(dose_msv, 2),
            model: *model,
            result_err: SciValue(f64::NAN),
            result_lar: SciValue(f64::NAN),
            equation: format!("ERR = nan ({error})"),
            baseline_incidence: NOT_AVAILABLE.into(),
            params: params.clone(),
            flag: None,
            error: Some(error.to_string()),
        }),
    }
}
