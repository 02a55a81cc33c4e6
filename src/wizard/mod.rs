// Wizard module - linear multi-step workflow navigation
//
// Steps are supplied from outside through the `WizardStep` trait; the
// controller sequences them, keeps back-navigation history and publishes
// capability flags for a presentation layer.

pub mod controller;
pub mod error;
pub mod history;
pub mod scripted;
pub mod signal;
pub mod step;

#[cfg(test)]
mod tests;

pub use controller::{NavigationFlags, NextOutcome, PreviousOutcome, WizardController};
pub use error::WizardError;
pub use history::StepHistory;
pub use scripted::{ScriptedFlow, ScriptedStep, StepSpec};
pub use signal::{Signal, Subscription};
pub use step::{StepProvider, StepRef, WizardStep};
