use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `beir` binary.
#[derive(Debug, Parser)]
#[command(
    name = "beir",
    version,
    about = "HotSpot dose-to-risk pipeline (BEIR V / BEIR VII)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only, no progress)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use beir_core::enums::{Metric, ModelOverride, Sex};
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_repeatable_filters() {
        let cli = Cli::try_parse_from([
            "beir",
            "run",
            "--input",
            "reports",
            "--exposure-age",
            "30",
            "--attained-age",
            "60",
            "--sex",
            "F",
            "--metric",
            "ERR",
            "--organ",
            "lung",
            "--organ",
            "thyroid",
            "--model",
            "vii",
            "--hide-high-dose",
        ])
        .expect("cli should parse");

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.input, PathBuf::from("reports"));
        assert_eq!(args.exposure_age, 30.0);
        assert_eq!(args.sexes, vec![Sex::Female]);
        assert_eq!(args.metrics, vec![Metric::Err]);
        assert_eq!(args.organs, vec!["lung", "thyroid"]);
        assert_eq!(args.model, Some(ModelOverride::Vii));
        assert!(args.hide_high_dose);
        assert!(!args.skip_audit);
    }

    #[test]
    fn run_requires_ages() {
        let parsed = Cli::try_parse_from(["beir", "run", "--input", "reports"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["beir", "schema", "--list", "--format", "table", "--quiet"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Table);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Schema(_)));
    }

    #[test]
    fn invalid_sex_is_rejected() {
        let parsed = Cli::try_parse_from([
            "beir",
            "run",
            "--input",
            "r",
            "--exposure-age",
            "1",
            "--attained-age",
            "2",
            "--sex",
            "X",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_needs_a_target() {
        assert!(Cli::try_parse_from(["beir", "validate"]).is_err());
        assert!(Cli::try_parse_from(["beir", "validate", "--log", "run.log"]).is_ok());
    }
}
