use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// RUST_LOG wins over the configured level when it is set.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_output {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(log_level = %config.log_level, json = config.json_output, "Telemetry initialized");
    Ok(())
}

/// Flush and tear down logging
pub fn shutdown_telemetry() {
    // The fmt subscriber writes synchronously; nothing to flush
    tracing::debug!("Telemetry shutdown complete");
}
