use std::path::PathBuf;

use beir_core::enums::{Metric, ModelOverride, Sex};
use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline: extract, transpose, compute risk, summarise, audit.
    Run(RunArgs),
    /// Shadow-audit an existing execution log.
    Audit(AuditArgs),
    /// Validate a parameter document or an execution log.
    Validate(ValidateArgs),
    /// Print a registered JSON Schema.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Directory of HotSpot `.txt` reports.
    #[arg(long)]
    pub input: PathBuf,

    /// Age at exposure (years).
    #[arg(long)]
    pub exposure_age: f64,

    /// Attained age for the risk projection (years).
    #[arg(long)]
    pub attained_age: f64,

    /// Output directory (defaults to `<output_root>/<run id>`).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Risk parameter document (defaults to `pipeline.params_file`).
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Run identifier `YYYYMMDDHHMMSS` (defaults to now).
    #[arg(long)]
    pub run_id: Option<String>,

    /// Restrict to one sex; repeatable.
    #[arg(long = "sex")]
    pub sexes: Vec<Sex>,

    /// Output metric (ERR, LAR); repeatable.
    #[arg(long = "metric")]
    pub metrics: Vec<Metric>,

    /// Restrict to one organ; repeatable.
    #[arg(long = "organ")]
    pub organs: Vec<String>,

    /// Drop scenarios whose every cell exceeded the dose ceiling.
    #[arg(long)]
    pub hide_high_dose: bool,

    /// Model policy: auto, vii, v.
    #[arg(long)]
    pub model: Option<ModelOverride>,

    /// Skip the shadow audit stage.
    #[arg(long)]
    pub skip_audit: bool,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Execution log to audit.
    #[arg(long)]
    pub log: PathBuf,

    /// Reference parameter document (defaults to `pipeline.params_file`).
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Directory for the report (defaults to the log's directory).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct ValidateArgs {
    /// Parameter document to check against the `risk_parameters` schema.
    #[arg(long, required_unless_present = "log")]
    pub params: Option<PathBuf>,

    /// Execution log whose payloads are checked line by line.
    #[arg(long)]
    pub log: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Registered schema name (e.g. `calc_log`, `risk_parameters`).
    #[arg(required_unless_present = "list")]
    pub name: Option<String>,

    /// List registered schema names.
    #[arg(long)]
    pub list: bool,
}
