pub mod audit;
pub mod run;
pub mod schema;
pub mod validate;

use beir_config::BeirConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;

/// Dispatch a parsed command to the corresponding handler module.
pub fn dispatch(command: &Commands, flags: &GlobalFlags, config: &BeirConfig) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => run::handle(args, flags, config),
        Commands::Audit(args) => audit::handle(args, flags, config),
        Commands::Validate(args) => validate::handle(args, flags),
        Commands::Schema(args) => schema::handle(args, flags),
    }
}
