//! Validation summary of one execution log.
//!
//! Reads the typed events back and reports input integrity, cell counts per
//! outcome and model, and the list of skipped cells.

use std::fmt::Write as _;
use std::path::Path;

use beir_core::enums::ModelName;
use beir_core::trail::{AuditEvent, CalcLog, NOT_AVAILABLE, read_log};

use crate::error::AuditError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub context: String,
    pub dose_msv: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub run_id: String,
    pub timestamp: String,
    pub dose_matrix_sha256: String,
    pub params_sha256: String,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub beir_v: usize,
    pub beir_vii: usize,
    pub config_warnings: usize,
    /// `Status` of the footer, or the failure type when the run aborted.
    pub outcome: String,
    pub skipped_items: Vec<SkippedItem>,
}

impl Default for ValidationSummary {
    fn default() -> Self {
        Self {
            run_id: "UNKNOWN".into(),
            timestamp: NOT_AVAILABLE.into(),
            dose_matrix_sha256: NOT_AVAILABLE.into(),
            params_sha256: NOT_AVAILABLE.into(),
            total: 0,
            success: 0,
            failed: 0,
            skipped: 0,
            beir_v: 0,
            beir_vii: 0,
            config_warnings: 0,
            outcome: "INCOMPLETE".into(),
            skipped_items: Vec::new(),
        }
    }
}

impl ValidationSummary {
    #[must_use]
    pub fn from_events(events: &[AuditEvent]) -> Self {
        let mut summary = Self::default();
        for event in events {
            match event {
                AuditEvent::Header(h) => {
                    summary.run_id.clone_from(&h.run_id);
                    summary.timestamp.clone_from(&h.timestamp);
                    summary.dose_matrix_sha256.clone_from(&h.inputs.dose_matrix_sha256);
                    summary.params_sha256.clone_from(&h.inputs.params_sha256);
                }
                AuditEvent::Calc(CalcLog::Skipped(s)) => {
                    summary.total += 1;
                    summary.skipped += 1;
                    summary.skipped_items.push(SkippedItem {
                        context: s.context.clone(),
                        dose_msv: s
                            .dose_measured_msv
                            .clone()
                            .unwrap_or_else(|| NOT_AVAILABLE.into()),
                        reason: s.reason.clone(),
                    });
                }
                AuditEvent::Calc(CalcLog::Computed(c)) => {
                    summary.total += 1;
                    if c.error.is_some() {
                        summary.failed += 1;
                    } else {
                        summary.success += 1;
                    }
                    match c.model {
                        ModelName::BeirV => summary.beir_v += 1,
                        ModelName::BeirVii => summary.beir_vii += 1,
                    }
                }
                AuditEvent::ConfigWarning(_) => summary.config_warnings += 1,
                AuditEvent::CriticalFailure(f) => summary.outcome.clone_from(&f.error_type),
                AuditEvent::Footer(f) => summary.outcome.clone_from(&f.status),
                AuditEvent::Stage(_) => {}
            }
        }
        summary
    }

    /// Read and summarise the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::MissingLog` when the file is absent and
    /// `AuditError::Trail` when it cannot be parsed.
    pub fn from_log(path: &Path) -> Result<Self, AuditError> {
        if !path.is_file() {
            return Err(AuditError::MissingLog(path.display().to_string()));
        }
        Ok(Self::from_events(&read_log(path)?))
    }

    #[must_use]
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Validation Summary\n");
        let _ = writeln!(out, "- **Run ID**: {}", self.run_id);
        let _ = writeln!(out, "- **Timestamp**: {}", self.timestamp);
        let _ = writeln!(out, "- **Outcome**: {}\n", self.outcome);

        let _ = writeln!(out, "## 1. Input Integrity (SHA-256)\n");
        let _ = writeln!(out, "| Input | Hash |");
        let _ = writeln!(out, "|---|---|");
        let _ = writeln!(out, "| Dose matrix CSV | `{}` |", self.dose_matrix_sha256);
        let _ = writeln!(out, "| Parameters JSON | `{}` |\n", self.params_sha256);

        let _ = writeln!(out, "## 2. Execution Summary\n");
        let _ = writeln!(out, "- **Total processed**: {}", self.total);
        let _ = writeln!(out, "- **Success**: {}", self.success);
        let _ = writeln!(out, "- **Failed**: {}", self.failed);
        let _ = writeln!(out, "- **Skipped**: {}", self.skipped);
        let _ = writeln!(out, "- **Models (V / VII)**: {} / {}", self.beir_v, self.beir_vii);
        let _ = writeln!(out, "- **Organs missing from parameters**: {}", self.config_warnings);

        if !self.skipped_items.is_empty() {
            let _ = writeln!(out, "\n## 3. Skipped Items\n");
            let _ = writeln!(out, "| Context (sex\\|organ\\|scenario) | Dose (mSv) | Reason |");
            let _ = writeln!(out, "|---|---|---|");
            for item in &self.skipped_items {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} |",
                    item.context.replace('|', "\\|"),
                    item.dose_msv,
                    item.reason
                );
            }
        }
        out
    }

    /// # Errors
    ///
    /// Returns `AuditError::Io` on write failure.
    pub fn write(&self, path: &Path) -> Result<(), AuditError> {
        std::fs::write(path, self.render_markdown())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beir_core::trail::parse_log;
    use pretty_assertions::assert_eq;

    const LOG: &str = r#"INFO | METADATA_HEADER: {"Event":"EXECUTION_START","Run_ID":"20260115093000","Timestamp_ISO":"2026-01-15T09:30:00","Inputs_Integrity":{"Dose_Matrix_Hash_SHA256":"aa11","Params_JSON_Hash_SHA256":"bb22"},"Configuration":{"Exposure_Age":30.0,"Attained_Age":60.0}}
WARNING | CALC_LOG: {"Row_ID":1,"Context":"male|breast|A_0.03","Status":"SKIPPED","Reason":"model not applicable to sex","Result_ERR":"N/A","Result_LAR":"N/A"}
WARNING | CALC_LOG: {"Row_ID":1,"Context":"male|breast|A_1.0","Status":"SKIPPED","Reason":"dose above the 4000 mSv ceiling","Dose_Measured_mSv":"5000.00","Result_ERR":"N/A","Result_LAR":"N/A"}
INFO | CALC_LOG: {"Row_ID":3,"Context":"male|lung|A_0.03","Dose_Sv":"1.0000e-02","Dose_mSv":"10.00","Model":"BEIR_VII","Result_ERR":"2.1333e-03","Result_LAR":"1.4933e-04","Equation":"","Baseline_Incidence":"7.00e-02","Params":{"Model_Type":"linear"}}
INFO | METADATA_FOOTER: {"Event":"EXECUTION_END","Status":"SUCCESS","Output_Generated":"out.csv","Total_Rows_Processed":2}
"#;

    #[test]
    fn counts_and_skipped_table() {
        let summary = ValidationSummary::from_events(&parse_log(LOG).unwrap());
        assert_eq!(
            (summary.total, summary.success, summary.skipped, summary.beir_vii, summary.beir_v),
            (3, 1, 2, 1, 0)
        );
        assert_eq!(summary.outcome, "SUCCESS");
        assert_eq!(summary.skipped_items[0].dose_msv, "N/A");
        assert_eq!(summary.skipped_items[1].dose_msv, "5000.00");

        let md = summary.render_markdown();
        assert!(md.contains("| Dose matrix CSV | `aa11` |"));
        assert!(md.contains("| male\\|breast\\|A_1.0 | 5000.00 | dose above the 4000 mSv ceiling |"));
        assert!(md.contains("- **Models (V / VII)**: 0 / 1"));
    }

    #[test]
    fn empty_log_is_incomplete() {
        let summary = ValidationSummary::from_events(&[]);
        assert_eq!(summary.outcome, "INCOMPLETE");
        assert!(!summary.render_markdown().contains("Skipped Items"));
    }
}
