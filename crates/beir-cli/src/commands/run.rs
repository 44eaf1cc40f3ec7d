use std::path::PathBuf;

use anyhow::{Context, bail};
use beir_config::BeirConfig;
use beir_core::run::{RunFilters, RunStamp};
use beir_engine::Ages;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::output::output;
use crate::pipeline::{Pipeline, PipelineOutcome, PipelineRequest};

#[derive(Debug, Serialize)]
struct AuditTally {
    total: usize,
    approved: usize,
    rejected: usize,
}

#[derive(Debug, Serialize)]
struct RunResponse {
    run_id: String,
    output_dir: String,
    extracted_records: usize,
    organs: usize,
    scenarios: usize,
    result_rows: usize,
    computed: usize,
    skipped: usize,
    failed: usize,
    suppressed: Vec<String>,
    audit: Option<AuditTally>,
    artifacts: Vec<String>,
}

/// Handle `beir run`.
pub fn handle(args: &RunArgs, flags: &GlobalFlags, config: &BeirConfig) -> anyhow::Result<()> {
    let request = build_request(args, config)?;
    tracing::info!(
        run_id = %request.stamp.id(),
        input = %request.input_dir.display(),
        "starting pipeline"
    );
    let outcome = Pipeline::run(&request)?;
    output(&response(&request, &outcome), flags.format)
}

fn build_request(args: &RunArgs, config: &BeirConfig) -> anyhow::Result<PipelineRequest> {
    for (name, age) in [
        ("--exposure-age", args.exposure_age),
        ("--attained-age", args.attained_age),
    ] {
        if !age.is_finite() || age < 0.0 {
            bail!("{name} must be a non-negative number, got {age}");
        }
    }

    let stamp = match &args.run_id {
        Some(id) => RunStamp::from_id(id).context("invalid --run-id")?,
        None => RunStamp::now(),
    };
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.pipeline.output_root_path().join(stamp.id()));

    Ok(PipelineRequest {
        input_dir: args.input.clone(),
        output_dir,
        params: args
            .params
            .clone()
            .unwrap_or_else(|| config.pipeline.params_path()),
        ages: Ages::new(args.exposure_age, args.attained_age),
        model_override: args.model.unwrap_or(config.pipeline.model_override),
        filters: merge_filters(args, &config.filters),
        stamp,
        run_audit: config.pipeline.run_audit && !args.skip_audit,
    })
}

/// Flags replace the configured selection only when given.
fn merge_filters(args: &RunArgs, configured: &RunFilters) -> RunFilters {
    let mut filters = configured.clone();
    if args.hide_high_dose {
        filters.show_high_dose = false;
    }
    if !args.sexes.is_empty() {
        filters.sexes.clone_from(&args.sexes);
    }
    if !args.metrics.is_empty() {
        filters.metrics.clone_from(&args.metrics);
    }
    if !args.organs.is_empty() {
        filters.organs = Some(args.organs.clone());
    }
    filters
}

fn response(request: &PipelineRequest, outcome: &PipelineOutcome) -> RunResponse {
    let layout = &outcome.layout;
    let mut artifacts: Vec<PathBuf> = vec![
        layout.extraction_csv(),
        layout.transposed_csv(),
        layout.risk_csv(),
        layout.execution_log(),
        layout.validation_summary(),
    ];
    if outcome.audit.is_some() {
        artifacts.push(layout.audit_report());
        artifacts.push(layout.audit_verdicts());
    }

    RunResponse {
        run_id: request.stamp.id(),
        output_dir: layout.dir().display().to_string(),
        extracted_records: outcome.extracted,
        organs: outcome.organs,
        scenarios: outcome.scenarios,
        result_rows: outcome.risk.rows,
        computed: outcome.risk.computed,
        skipped: outcome.risk.skipped,
        failed: outcome.risk.failed,
        suppressed: outcome.risk.suppressed.clone(),
        audit: outcome.audit.as_ref().map(|a| AuditTally {
            total: a.total,
            approved: a.approved,
            rejected: a.rejected,
        }),
        artifacts: artifacts
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beir_core::enums::{Metric, ModelOverride, Sex};
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use crate::cli::{Cli, Commands};

    fn args(extra: &[&str]) -> RunArgs {
        let mut argv = vec![
            "beir",
            "run",
            "--input",
            "reports",
            "--exposure-age",
            "30",
            "--attained-age",
            "60",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).expect("cli should parse").command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_supplies_defaults() {
        let request = build_request(&args(&["--run-id", "20260115093000"]), &BeirConfig::default())
            .unwrap();
        assert_eq!(request.output_dir, PathBuf::from("output/20260115093000"));
        assert_eq!(request.params, PathBuf::from("data/risk_parameters.json"));
        assert_eq!(request.model_override, ModelOverride::Auto);
        assert!(request.run_audit);
        assert_eq!(request.filters, RunFilters::default());
    }

    #[test]
    fn flags_override_config() {
        let mut config = BeirConfig::default();
        config.pipeline.model_override = ModelOverride::V;
        config.filters.organs = Some(vec!["brain".into()]);

        let request = build_request(
            &args(&[
                "--model", "vii", "--sex", "M", "--metric", "LAR", "--organ", "lung",
                "--hide-high-dose", "--skip-audit", "--output", "out",
            ]),
            &config,
        )
        .unwrap();
        assert_eq!(request.model_override, ModelOverride::Vii);
        assert_eq!(request.filters.sexes, vec![Sex::Male]);
        assert_eq!(request.filters.metrics, vec![Metric::Lar]);
        assert_eq!(request.filters.organs, Some(vec!["lung".to_string()]));
        assert!(!request.filters.show_high_dose);
        assert!(!request.run_audit);
        assert_eq!(request.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn configured_organs_survive_without_flags() {
        let mut config = BeirConfig::default();
        config.filters.organs = Some(vec!["brain".into()]);
        let request = build_request(&args(&[]), &config).unwrap();
        assert_eq!(request.filters.organs, Some(vec!["brain".to_string()]));
    }

    #[test]
    fn bad_run_id_and_negative_age_are_rejected() {
        let config = BeirConfig::default();
        assert!(build_request(&args(&["--run-id", "yesterday"]), &config).is_err());

        let mut negative = args(&[]);
        negative.exposure_age = -1.0;
        let err = build_request(&negative, &config).unwrap_err();
        assert!(err.to_string().contains("--exposure-age"));
    }
}
