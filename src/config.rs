use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::wizard::StepSpec;

pub const DEFAULT_DISPLAY_NAME: &str = "Import Data";
const CONFIG_FILE: &str = "import-wizard.toml";
const ENV_PREFIX: &str = "IMPORT_WIZARD";

/// Configuration for the wizard host.
///
/// Passed explicitly to whatever needs it; steps never read it from a
/// global.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Title shown by the presentation layer
    pub display_name: String,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Scripted flow driven by the CLI
    pub flow: FlowConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON instead of human-readable lines
    pub json_output: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            observability: ObservabilityConfig::default(),
            flow: FlowConfig {
                steps: vec![
                    StepSpec::new("Select source"),
                    StepSpec::new("Map fields"),
                    StepSpec::new("Confirm import"),
                ],
            },
        }
    }
}

impl WizardConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. import-wizard.toml in the working directory
    /// 3. Environment variables (IMPORT_WIZARD__DISPLAY_NAME, ...)
    pub fn load() -> Result<Self> {
        let file = Path::new(CONFIG_FILE);
        Self::load_from(file.exists().then_some(file))
    }

    /// Same as [`WizardConfig::load`] with an explicit file. Missing keys
    /// fall back to the defaults.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
