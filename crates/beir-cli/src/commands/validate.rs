use anyhow::{Context, bail};
use beir_schema::LogValidationReport;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ValidateArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ParamsResponse {
    path: String,
    valid: bool,
    organs: usize,
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct ValidateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<ParamsResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<LogValidationReport>,
}

/// Handle `beir validate`.
///
/// Prints what was checked, then fails if the log carried invalid payloads.
/// An invalid parameter document fails before anything is printed.
pub fn handle(args: &ValidateArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let params = match &args.params {
        Some(path) => {
            let set = beir_schema::load_risk_parameters(path)
                .context("parameter validation failed")?;
            Some(ParamsResponse {
                path: path.display().to_string(),
                valid: true,
                organs: set.configurations.len(),
                version: set.metadata.map(|m| m.version),
            })
        }
        None => None,
    };

    let log = match &args.log {
        Some(path) => Some(
            beir_schema::validate_execution_log(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let invalid_lines = log.as_ref().map_or(0, |report| report.errors.len());
    output(&ValidateResponse { params, log }, flags.format)?;

    if invalid_lines > 0 {
        bail!("execution log has {invalid_lines} invalid event(s)");
    }
    Ok(())
}
