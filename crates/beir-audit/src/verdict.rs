//! Audit verdicts and the run-level tally.

use std::fmt;

use beir_core::enums::ModelName;
use beir_core::numeric::SciValue;
use serde::{Deserialize, Serialize};

/// Absolute ERR difference accepted without further checks.
pub const ABSOLUTE_TOLERANCE: f64 = 1e-6;
/// Relative ERR difference below which a mismatch is only marginal.
pub const RELATIVE_TOLERANCE: f64 = 0.01;
/// Model selection threshold (Sv) and the relative band treated as an edge case.
pub const MODEL_BOUNDARY_SV: f64 = 0.1;
pub const BOUNDARY_TOLERANCE: f64 = 1e-5;

/// Failure category. Serialized with the report codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "MODELO")]
    ModelSelection,
    #[serde(rename = "CONFIG_AUSENTE")]
    MissingConfig,
    #[serde(rename = "CALCULO")]
    Calculation,
    #[serde(rename = "ESTRUTURA")]
    Structure,
}

impl Category {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ModelSelection => "MODELO",
            Self::MissingConfig => "CONFIG_AUSENTE",
            Self::Calculation => "CALCULO",
            Self::Structure => "ESTRUTURA",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub category: Category,
    pub message: String,
}

/// Outcome of auditing one `CALC_LOG` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryVerdict {
    pub row_id: Option<u64>,
    pub context: String,
    pub status: Status,
    pub model: Option<ModelName>,
    pub logged_err: SciValue,
    pub expected_err: SciValue,
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>,
    pub trace: Vec<String>,
}

impl EntryVerdict {
    pub(crate) fn new(row_id: Option<u64>, context: impl Into<String>) -> Self {
        Self {
            row_id,
            context: context.into(),
            status: Status::Approved,
            model: None,
            logged_err: SciValue(f64::NAN),
            expected_err: SciValue(0.0),
            failures: Vec::new(),
            warnings: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// An entry whose payload could not be read as a calculation.
    pub(crate) fn structural(row_id: Option<u64>, context: impl Into<String>, message: String) -> Self {
        let mut verdict = Self::new(row_id, context);
        verdict.reject(Category::Structure, message);
        verdict
    }

    pub(crate) fn reject(&mut self, category: Category, message: String) {
        self.status = Status::Rejected;
        self.failures.push(Failure { category, message });
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == Status::Approved
    }

    #[must_use]
    pub fn has(&self, category: Category) -> bool {
        self.failures.iter().any(|f| f.category == category)
    }
}

/// Run-level tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub model_errors: usize,
    pub config_errors: usize,
    pub calculation_errors: usize,
    pub structure_errors: usize,
    pub header_found: bool,
    pub exposure_age: f64,
    pub attained_age: f64,
}

impl AuditSummary {
    pub(crate) fn count(&mut self, verdict: &EntryVerdict) {
        self.total += 1;
        if verdict.is_approved() {
            self.approved += 1;
            return;
        }
        self.rejected += 1;
        for (category, slot) in [
            (Category::ModelSelection, &mut self.model_errors),
            (Category::MissingConfig, &mut self.config_errors),
            (Category::Calculation, &mut self.calculation_errors),
            (Category::Structure, &mut self.structure_errors),
        ] {
            if verdict.has(category) {
                *slot += 1;
            }
        }
    }

    #[must_use]
    pub const fn passed(&self) -> bool {
        self.rejected == 0
    }
}

/// Everything one audit produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditReport {
    pub summary: AuditSummary,
    pub entries: Vec<EntryVerdict>,
}

impl AuditReport {
    pub(crate) fn push(&mut self, verdict: EntryVerdict) {
        self.summary.count(&verdict);
        self.entries.push(verdict);
    }

    #[must_use]
    pub fn rejected(&self) -> impl Iterator<Item = &EntryVerdict> {
        self.entries.iter().filter(|e| !e.is_approved())
    }
}

/// Compare a logged ERR with the recomputed one.
///
/// Returns the trace line and whether the pair is a calculation discrepancy.
#[must_use]
pub fn compare(logged: f64, expected: f64) -> (String, bool) {
    if logged.is_nan() {
        return if expected.is_nan() {
            ("- Both values are NaN (undefined risk)".into(), false)
        } else {
            (format!("- System=NaN vs Auditor={expected:.4e}"), true)
        };
    }
    let diff = (logged - expected).abs();
    if diff <= ABSOLUTE_TOLERANCE {
        return (format!("- Values agree (delta={diff:.2e})"), false);
    }
    if expected == 0.0 {
        return (format!("- System={logged:.4e} vs Auditor=0.0"), true);
    }
    let relative = diff / expected.abs();
    if relative > RELATIVE_TOLERANCE {
        (
            format!("- Discrepancy above 1%: System={logged:.4e}, Auditor={expected:.4e}"),
            true,
        )
    } else {
        (
            format!("- Marginal difference ({:.2}%), accepted", relative * 100.0),
            false,
        )
    }
}
