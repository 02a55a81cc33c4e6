use anyhow::Result;
use clap::Parser;

use import_wizard::cli::commands::run::RunCommand;
use import_wizard::cli::commands::show_config::ShowConfigCommand;
use import_wizard::cli::commands::Command;
use import_wizard::cli::{Cli, Commands};
use import_wizard::{init_telemetry, shutdown_telemetry, WizardConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    WizardConfig::load_env_file()?;
    let config = match &cli.config {
        Some(path) => WizardConfig::load_from(Some(path.as_path()))?,
        None => WizardConfig::load()?,
    };
    init_telemetry(&config.observability)?;

    // The wizard is single-threaded by construction; a current-thread runtime
    // is its ordering domain
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = match cli.command {
        Commands::Run { actions, json } => runtime.block_on(async move {
            RunCommand::new(config, actions)
                .with_json(json)
                .execute()
                .await
        }),
        Commands::Config => runtime.block_on(async move { ShowConfigCommand::new(config).execute().await }),
    };

    shutdown_telemetry();
    result
}
