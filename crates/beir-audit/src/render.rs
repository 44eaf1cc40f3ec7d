//! Markdown audit report and JSONL verdict export.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::AuditError;
use crate::verdict::AuditReport;

/// Render the human-readable audit report. `source` names the audited log.
#[must_use]
pub fn render_markdown(report: &AuditReport, source: &str) -> String {
    let s = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "# BEIR Shadow Audit Report\n");
    let _ = writeln!(out, "**Execution log**: `{source}`\n");

    let _ = writeln!(out, "## 1. Executive Summary\n");
    let _ = writeln!(out, "- **Total audited**: {}", s.total);
    let _ = writeln!(out, "- **Approved**: {}", s.approved);
    let _ = writeln!(out, "- **Rejected**: {}", s.rejected);
    let _ = writeln!(
        out,
        "- **Failures by category**: MODELO={}, CONFIG_AUSENTE={}, CALCULO={}, ESTRUTURA={}",
        s.model_errors, s.config_errors, s.calculation_errors, s.structure_errors
    );
    if s.header_found {
        let _ = writeln!(
            out,
            "- **Run ages**: exposure={}, attained={}",
            s.exposure_age, s.attained_age
        );
    } else {
        let _ = writeln!(out, "- **Run ages**: header not found, ages taken as 0");
    }
    let _ = writeln!(
        out,
        "- **Status**: {}\n",
        if s.passed() { "APPROVED" } else { "REJECTED" }
    );

    let _ = writeln!(out, "## 2. Entry-by-entry Audit\n");
    for entry in &report.entries {
        let row = entry
            .row_id
            .map_or_else(|| "N/A".to_string(), |id| id.to_string());
        let mark = if entry.is_approved() { "PASS" } else { "FAIL" };
        let _ = writeln!(out, "### [{mark}] Row {row}: {}", entry.context);
        let _ = writeln!(
            out,
            "**Comparison**: System=`{}` | Auditor=`{}`\n",
            entry.logged_err, entry.expected_err
        );
        if !entry.failures.is_empty() {
            let _ = writeln!(out, "**Failures:**");
            for failure in &entry.failures {
                let _ = writeln!(out, "- {}: {}", failure.category, failure.message);
            }
            out.push('\n');
        }
        if !entry.warnings.is_empty() {
            let _ = writeln!(out, "**Warnings:**");
            for warning in &entry.warnings {
                let _ = writeln!(out, "- {warning}");
            }
            out.push('\n');
        }
        if !entry.trace.is_empty() {
            let _ = writeln!(out, "**Derivation:**");
            for line in &entry.trace {
                let _ = writeln!(out, "{line}");
            }
        }
        let _ = writeln!(out, "\n---\n");
    }
    out
}

/// Write the Markdown report to `path`.
///
/// # Errors
///
/// Returns `AuditError::Io` on write failure.
pub fn write_report(report: &AuditReport, source: &str, path: &Path) -> Result<(), AuditError> {
    std::fs::write(path, render_markdown(report, source))?;
    Ok(())
}

/// Export one JSON verdict per line.
///
/// # Errors
///
/// Returns `AuditError::Io` on write failure.
pub fn write_verdicts(report: &AuditReport, path: &Path) -> Result<(), AuditError> {
    serde_jsonlines::write_json_lines(path, &report.entries)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{Category, EntryVerdict};

    fn report() -> AuditReport {
        let mut report = AuditReport::default();
        let mut ok = EntryVerdict::new(Some(1), "male|lung|A_0.03");
        ok.logged_err = 0.002.into();
        ok.expected_err = 0.002.into();
        ok.trace.push("- Values agree (delta=0.00e+00)".into());
        report.push(ok);
        report.push(EntryVerdict::structural(None, "line 7", "payload is not valid JSON".into()));
        report
    }

    #[test]
    fn markdown_has_summary_and_entries() {
        let md = render_markdown(&report(), "4_execution_log.log");
        assert!(md.contains("- **Total audited**: 2"));
        assert!(md.contains("ESTRUTURA=1"));
        assert!(md.contains("### [PASS] Row 1: male|lung|A_0.03"));
        assert!(md.contains("System=`2.0000e-03` | Auditor=`2.0000e-03`"));
        assert!(md.contains("### [FAIL] Row N/A: line 7"));
        assert!(md.contains("- **Status**: REJECTED"));
        assert!(md.contains("header not found"));
    }

    #[test]
    fn verdicts_export_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("6_shadow_audit.jsonl");
        write_verdicts(&report(), &path).unwrap();

        let back: Vec<EntryVerdict> = serde_jsonlines::json_lines(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(back.len(), 2);
        assert!(back[1].has(Category::Structure));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().next().unwrap().contains("\"status\":\"APPROVED\""));
    }
}
