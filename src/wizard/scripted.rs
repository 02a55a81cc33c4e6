// Configurable steps for demos and tests - no real import work happens here

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::wizard::signal::Signal;
use crate::wizard::step::{StepProvider, StepRef, WizardStep};

/// Declarative description of one scripted step
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StepSpec {
    pub title: String,
    /// Result of `validate()`
    #[serde(default = "default_true")]
    pub valid: bool,
    /// Initial value of the `has_next` signal
    #[serde(default = "default_true")]
    pub has_next: bool,
    /// When set, resolving the successor fails with this message
    #[serde(default)]
    pub fail: Option<String>,
    /// Simulated resolution time
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl StepSpec {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            valid: true,
            has_next: true,
            fail: None,
            delay_ms: None,
        }
    }
}

/// A step whose behavior is set from the outside
#[derive(Debug)]
pub struct ScriptedStep {
    title: String,
    has_next: Signal<bool>,
    valid: Cell<bool>,
    failure: RefCell<Option<String>>,
    successor: RefCell<Option<StepRef>>,
    delay: Cell<Option<Duration>>,
    activations: Cell<u32>,
    deactivations: Cell<u32>,
    resolutions: Cell<u32>,
}

impl ScriptedStep {
    /// A valid terminal step with `has_next` set
    pub fn new(title: &str) -> Rc<Self> {
        Rc::new(Self {
            title: title.to_string(),
            has_next: Signal::new(true),
            valid: Cell::new(true),
            failure: RefCell::new(None),
            successor: RefCell::new(None),
            delay: Cell::new(None),
            activations: Cell::new(0),
            deactivations: Cell::new(0),
            resolutions: Cell::new(0),
        })
    }

    pub fn from_spec(spec: &StepSpec) -> Rc<Self> {
        let step = Self::new(&spec.title);
        step.set_valid(spec.valid);
        step.set_has_next(spec.has_next);
        step.set_failure(spec.fail.clone());
        step.set_delay(spec.delay_ms.map(Duration::from_millis));
        step
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.set(valid);
    }

    pub fn set_has_next(&self, has_next: bool) {
        self.has_next.set(has_next);
    }

    pub fn set_failure(&self, message: Option<String>) {
        *self.failure.borrow_mut() = message;
    }

    pub fn set_successor(&self, successor: Option<StepRef>) {
        *self.successor.borrow_mut() = successor;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.delay.set(delay);
    }

    pub fn activations(&self) -> u32 {
        self.activations.get()
    }

    pub fn deactivations(&self) -> u32 {
        self.deactivations.get()
    }

    /// How many times `next()` was awaited on this step
    pub fn resolutions(&self) -> u32 {
        self.resolutions.get()
    }
}

#[async_trait(?Send)]
impl WizardStep for ScriptedStep {
    fn title(&self) -> &str {
        &self.title
    }

    fn validate(&self) -> bool {
        self.valid.get()
    }

    fn has_next(&self) -> &Signal<bool> {
        &self.has_next
    }

    async fn next(&self) -> Result<Option<StepRef>> {
        self.resolutions.set(self.resolutions.get() + 1);

        match self.delay.get() {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        if let Some(message) = self.failure.borrow().clone() {
            return Err(anyhow!(message));
        }
        Ok(self.successor.borrow().clone())
    }

    fn activated(&self) {
        self.activations.set(self.activations.get() + 1);
    }

    fn deactivated(&self) {
        self.deactivations.set(self.deactivations.get() + 1);
    }
}

/// A linear chain of scripted steps, first to last
#[derive(Debug, Default)]
pub struct ScriptedFlow {
    steps: Vec<Rc<ScriptedStep>>,
}

impl ScriptedFlow {
    pub fn from_specs(specs: &[StepSpec]) -> Self {
        let steps: Vec<Rc<ScriptedStep>> = specs.iter().map(ScriptedStep::from_spec).collect();
        for pair in steps.windows(2) {
            let successor: StepRef = pair[1].clone();
            pair[0].set_successor(Some(successor));
        }
        Self { steps }
    }

    pub fn step(&self, index: usize) -> Option<&Rc<ScriptedStep>> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl StepProvider for ScriptedFlow {
    fn bootstrap(&self) -> Result<StepRef> {
        let first = self
            .steps
            .first()
            .ok_or_else(|| anyhow!("scripted flow has no steps"))?;
        let step: StepRef = first.clone();
        Ok(step)
    }
}
