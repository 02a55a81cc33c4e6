use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "import-wizard")]
#[command(about = "Drive a linear import wizard from the terminal")]
#[command(long_about = "Runs a scripted import wizard through the navigation controller. \
                       Steps come from the [flow] section of import-wizard.toml; the \
                       --actions list plays the role of the user pressing Next and Back.")]
pub struct Cli {
    /// Configuration file (defaults to ./import-wizard.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a sequence of navigation actions against the configured flow
    Run {
        /// Comma-separated actions, e.g. next,next,previous
        #[arg(long, value_enum, value_delimiter = ',', default_values = ["next", "next", "previous", "next", "next"])]
        actions: Vec<Action>,
        /// Print one JSON object per action instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Next,
    #[value(alias = "back")]
    Previous,
}
