//! Log replay: one verdict per computed `CALC_LOG` entry.

use std::path::Path;

use beir_core::enums::{ModelName, ModelOverride};
use beir_core::trail::{
    CellContext, ComputedCalc, ExecutionHeader, TAG_CALC, TAG_HEADER, locate_tag,
};
use beir_schema::SchemaRegistry;
use serde_json::Value;

use crate::error::AuditError;
use crate::reference::Reference;
use crate::shadow;
use crate::verdict::{
    AuditReport, BOUNDARY_TOLERANCE, Category, EntryVerdict, MODEL_BOUNDARY_SV, compare,
};

const SKIPPED: &str = "SKIPPED";

/// Run-level settings recovered from the first header.
#[derive(Debug, Clone, Copy, Default)]
struct RunContext {
    exposure: f64,
    attained: f64,
    model_override: ModelOverride,
}

impl From<&ExecutionHeader> for RunContext {
    fn from(header: &ExecutionHeader) -> Self {
        Self {
            exposure: header.configuration.exposure_age,
            attained: header.configuration.attained_age,
            model_override: header.configuration.model_override,
        }
    }
}

/// Recomputes logged cells from the raw reference document.
pub struct ShadowAuditor {
    reference: Reference,
    calc_schema: jsonschema::Validator,
}

impl ShadowAuditor {
    /// # Errors
    ///
    /// Returns `AuditError::Schema` if the `calc_log` schema does not compile.
    pub fn new(reference: Reference) -> Result<Self, AuditError> {
        let calc_schema = SchemaRegistry::new().compile("calc_log")?;
        Ok(Self {
            reference,
            calc_schema,
        })
    }

    /// Audit the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::MissingLog` when the file does not exist and
    /// `AuditError::Io` when it cannot be read.
    pub fn audit_log(&self, path: &Path) -> Result<AuditReport, AuditError> {
        if !path.is_file() {
            return Err(AuditError::MissingLog(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(self.audit_text(&text))
    }

    /// Audit a log held in memory.
    #[must_use]
    pub fn audit_text(&self, text: &str) -> AuditReport {
        let mut report = AuditReport::default();
        let mut run: Option<RunContext> = None;

        for (index, line) in text.lines().enumerate() {
            let Some((tag, payload)) = locate_tag(line) else {
                continue;
            };
            match tag {
                TAG_HEADER if run.is_none() => {
                    match serde_json::from_str::<ExecutionHeader>(payload) {
                        Ok(header) => run = Some(RunContext::from(&header)),
                        Err(e) => tracing::warn!(line = index + 1, "unreadable run header: {e}"),
                    }
                }
                TAG_CALC => {
                    if let Some(verdict) =
                        self.audit_payload(payload, index + 1, run.unwrap_or_default())
                    {
                        report.push(verdict);
                    }
                }
                _ => {}
            }
        }

        let ctx = run.unwrap_or_default();
        report.summary.header_found = run.is_some();
        report.summary.exposure_age = ctx.exposure;
        report.summary.attained_age = ctx.attained;
        tracing::info!(
            total = report.summary.total,
            approved = report.summary.approved,
            rejected = report.summary.rejected,
            "shadow audit finished"
        );
        report
    }

    fn audit_payload(&self, payload: &str, line_no: usize, run: RunContext) -> Option<EntryVerdict> {
        let value: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                return Some(EntryVerdict::structural(
                    None,
                    format!("line {line_no}"),
                    format!("payload is not valid JSON: {e}"),
                ));
            }
        };
        if value.get("Status").and_then(Value::as_str) == Some(SKIPPED) {
            return None;
        }

        let row_id = value.get("Row_ID").and_then(Value::as_u64);
        let context = value
            .get("Context")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if let Err(e) = beir_schema::check(&self.calc_schema, &value) {
            return Some(EntryVerdict::structural(row_id, context, e.to_string()));
        }
        match serde_json::from_value::<ComputedCalc>(value) {
            Ok(calc) => Some(self.audit_entry(&calc, run)),
            Err(e) => Some(EntryVerdict::structural(
                row_id,
                context,
                format!("not a computed entry: {e}"),
            )),
        }
    }

    fn audit_entry(&self, calc: &ComputedCalc, run: RunContext) -> EntryVerdict {
        let mut verdict = EntryVerdict::new(Some(calc.row_id), calc.context.clone());
        verdict.model = Some(calc.model);
        verdict.logged_err = calc.result_err;

        let Some(cell) = CellContext::parse(&calc.context) else {
            verdict.reject(
                Category::Structure,
                "context must read sex|organ|scenario".into(),
            );
            return verdict;
        };
        let sex_key = if cell.sex == "male" { "M" } else { "F" };
        let dose = calc.dose_sv.get();

        verdict.trace.push(format!(
            "- **Input**: dose={dose:.6} Sv, sex={}, organ={}",
            cell.sex, cell.organ
        ));
        verdict.trace.push(format!(
            "- **Run ages**: exposure={}, attained={}",
            run.exposure, run.attained
        ));

        check_model(&mut verdict, calc.model, dose, run.model_override);

        let Some(organ) = self.reference.organ(&cell.organ) else {
            verdict.reject(
                Category::MissingConfig,
                format!("organ '{}' not found in the reference document", cell.organ),
            );
            verdict.trace.push("- Organ configuration not found".into());
            return verdict;
        };

        let recalculated = match calc.model {
            ModelName::BeirVii => {
                shadow::beir_vii(organ, sex_key, dose, run.exposure, run.attained)
            }
            ModelName::BeirV => shadow::beir_v(organ, &cell.sex, dose, run.exposure, run.attained),
        };
        verdict.trace.extend(recalculated.trace);
        verdict.expected_err = recalculated.err.into();

        let (line, mismatch) = compare(calc.result_err.get(), recalculated.err);
        verdict.trace.push(line);
        if mismatch {
            verdict.reject(
                Category::Calculation,
                format!(
                    "logged ERR {} differs from recomputed {}",
                    calc.result_err, verdict.expected_err
                ),
            );
        }
        verdict
    }
}

fn check_model(verdict: &mut EntryVerdict, logged: ModelName, dose: f64, model_override: ModelOverride) {
    let expected = model_override.forced().unwrap_or(if dose < MODEL_BOUNDARY_SV {
        ModelName::BeirVii
    } else {
        ModelName::BeirV
    });
    if logged == expected {
        verdict.trace.push(format!("- **Model selection**: correct ({logged})"));
        return;
    }
    let at_boundary = model_override == ModelOverride::Auto
        && (dose - MODEL_BOUNDARY_SV).abs() <= BOUNDARY_TOLERANCE * MODEL_BOUNDARY_SV;
    if at_boundary {
        verdict
            .warnings
            .push(format!("dose {dose} Sv sits on the model boundary, {logged} accepted"));
        verdict
            .trace
            .push("- **Model selection**: boundary edge case, accepted".into());
    } else {
        verdict.reject(
            Category::ModelSelection,
            format!("dose requires {expected}, log used {logged}"),
        );
        verdict.trace.push(format!(
            "- **Model selection**: expected {expected}, found {logged}"
        ));
    }
}
