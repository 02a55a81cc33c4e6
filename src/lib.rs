// Import Wizard Library - linear multi-step workflow navigation
// This exposes the controller, the step contract and the ambient pieces
// (config, telemetry, metrics) used by the CLI and by embedding hosts.

pub mod cli;
pub mod config;
pub mod observability;
pub mod telemetry;
pub mod wizard;

// Re-export key types for easy access
pub use config::{FlowConfig, ObservabilityConfig, WizardConfig, DEFAULT_DISPLAY_NAME};
pub use observability::{create_wizard_span, NavigationMetrics, NavigationStats, OperationTimer};
pub use telemetry::{init_telemetry, shutdown_telemetry};
pub use wizard::{
    NavigationFlags, NextOutcome, PreviousOutcome, ScriptedFlow, ScriptedStep, Signal, StepHistory,
    StepProvider, StepRef, StepSpec, Subscription, WizardController, WizardError, WizardStep,
};
