use anyhow::Result;
use std::io::Write;

use crate::cli::commands::Command;
use crate::config::WizardConfig;

pub struct ShowConfigCommand {
    config: WizardConfig,
}

impl ShowConfigCommand {
    pub fn new(config: WizardConfig) -> Self {
        Self { config }
    }

    pub fn execute_to<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(out, "{}", self.config.to_toml()?)?;
        Ok(())
    }
}

impl Command for ShowConfigCommand {
    async fn execute(&self) -> Result<()> {
        self.execute_to(&mut std::io::stdout().lock())
    }
}
