use std::path::{Path, PathBuf};

use anyhow::Context;
use beir_audit::AuditOutputs;
use beir_config::BeirConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::output::output;
use crate::progress::Progress;

/// Handle `beir audit`.
pub fn handle(args: &AuditArgs, flags: &GlobalFlags, config: &BeirConfig) -> anyhow::Result<()> {
    let params = args
        .params
        .clone()
        .unwrap_or_else(|| config.pipeline.params_path());
    let dir = match &args.output {
        Some(dir) => dir.clone(),
        None => args
            .log
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let (report, verdicts) = artifact_paths(&args.log, &dir);

    let progress = Progress::spinner("running the shadow audit");
    let result = beir_audit::audit_run(
        &args.log,
        &params,
        AuditOutputs {
            report: &report,
            verdicts: &verdicts,
        },
    );
    let audit = match result {
        Ok(audit) => {
            progress.finish_ok("audit finished");
            audit
        }
        Err(error) => {
            progress.finish_err("audit aborted");
            return Err(error).context("shadow audit failed");
        }
    };

    tracing::info!(
        report = %report.display(),
        rejected = audit.summary.rejected,
        "shadow audit written"
    );
    output(&audit.summary, flags.format)
}

/// Report names follow the log name: `4_execution_log_<suffix>.log` becomes
/// `6_shadow_audit_<suffix>.md` (and `.jsonl`). Other names get a suffix.
fn artifact_paths(log: &Path, dir: &Path) -> (PathBuf, PathBuf) {
    let stem = log
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("execution_log");
    let base = stem.strip_prefix("4_execution_log").map_or_else(
        || format!("{stem}_shadow_audit"),
        |suffix| format!("6_shadow_audit{suffix}"),
    );
    (
        dir.join(format!("{base}.md")),
        dir.join(format!("{base}.jsonl")),
    )
}
