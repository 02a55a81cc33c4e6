// Step capability contract - the seams the controller is tested through

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::rc::Rc;

use crate::wizard::signal::Signal;

/// Shared handle to a step. Steps live on the wizard's ordering domain, so
/// handles are `Rc`, not `Arc`.
pub type StepRef = Rc<dyn WizardStep>;

/// A unit of an interactive linear workflow.
///
/// The controller knows nothing about concrete step types. A step that was
/// pushed to history may be activated again later without being recreated,
/// so `activated` must tolerate being called more than once.
#[async_trait(?Send)]
pub trait WizardStep {
    /// Human-readable name, used in logs and error reports
    fn title(&self) -> &str;

    /// Check whether the user input on this step allows moving forward.
    /// Must not touch navigation state; may record details for display.
    fn validate(&self) -> bool;

    /// Observable "a successor can be requested" flag
    fn has_next(&self) -> &Signal<bool>;

    /// Resolve the successor. `Ok(None)` means this is the terminal step.
    async fn next(&self) -> Result<Option<StepRef>>;

    /// Called when the step becomes the active one
    fn activated(&self) {}

    /// Called when the step stops being the active one
    fn deactivated(&self) {}
}

impl fmt::Debug for dyn WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardStep")
            .field("title", &self.title())
            .finish()
    }
}

/// Factory for the bootstrap step of a wizard
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait StepProvider {
    fn bootstrap(&self) -> Result<StepRef>;
}
