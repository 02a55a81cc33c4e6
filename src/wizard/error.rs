use thiserror::Error;

/// Failures surfaced by the wizard controller.
///
/// Validation failures and ignored reentrant calls are not errors; they come
/// back as outcomes. Everything here is reported to the caller.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("wizard has not been initialized")]
    NotInitialized,
    #[error("wizard is already initialized")]
    AlreadyInitialized,
    #[error("wizard has been closed")]
    Closed,
    #[error("step '{step}' failed to resolve its successor: {source}")]
    StepResolution {
        step: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to create the bootstrap step: {0}")]
    Bootstrap(#[source] anyhow::Error),
}

impl WizardError {
    /// Misuse of the controller by its host, as opposed to a step failing
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            WizardError::NotInitialized | WizardError::AlreadyInitialized | WizardError::Closed
        )
    }
}
