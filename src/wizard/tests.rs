// Tests for the wizard controller internals and its seams

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::watch;

use super::controller::*;
use super::error::WizardError;
use super::scripted::{ScriptedFlow, ScriptedStep, StepSpec};
use super::signal::Signal;
use super::step::*;

/// Step that records the flags it sees while resolving
struct ProbeStep {
    has_next: Signal<bool>,
    flags: watch::Receiver<NavigationFlags>,
    busy_during_resolution: Cell<Option<bool>>,
    outcome: RefCell<Option<Result<Option<StepRef>>>>,
}

impl ProbeStep {
    fn new(flags: watch::Receiver<NavigationFlags>, outcome: Result<Option<StepRef>>) -> Rc<Self> {
        Rc::new(Self {
            has_next: Signal::new(true),
            flags,
            busy_during_resolution: Cell::new(None),
            outcome: RefCell::new(Some(outcome)),
        })
    }
}

#[async_trait(?Send)]
impl WizardStep for ProbeStep {
    fn title(&self) -> &str {
        "Probe"
    }

    fn validate(&self) -> bool {
        true
    }

    fn has_next(&self) -> &Signal<bool> {
        &self.has_next
    }

    async fn next(&self) -> Result<Option<StepRef>> {
        self.busy_during_resolution
            .set(Some(self.flags.borrow().is_busy));
        tokio::task::yield_now().await;
        self.outcome
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Ok(None))
    }
}

fn chain(titles: &[&str]) -> ScriptedFlow {
    let specs: Vec<StepSpec> = titles.iter().map(|t| StepSpec::new(t)).collect();
    ScriptedFlow::from_specs(&specs)
}

#[test]
fn test_start_uses_provider_bootstrap() {
    let step: StepRef = ScriptedStep::new("Select source");
    let bootstrap = Rc::clone(&step);

    let mut provider = MockStepProvider::new();
    provider
        .expect_bootstrap()
        .times(1)
        .returning_st(move || Ok(Rc::clone(&bootstrap)));

    let wizard = WizardController::new("Import Data");
    wizard.start(&provider).unwrap();

    assert!(wizard.is_initialized());
    assert!(Rc::ptr_eq(&wizard.active_step().unwrap(), &step));
    assert!(wizard.can_next());
    assert!(!wizard.can_previous());
}

#[test]
fn test_start_reports_bootstrap_failure() {
    let mut provider = MockStepProvider::new();
    provider
        .expect_bootstrap()
        .times(1)
        .returning_st(|| Err(anyhow!("no import handler registered")));

    let wizard = WizardController::new("Import Data");
    let err = wizard.start(&provider).unwrap_err();

    assert!(matches!(err, WizardError::Bootstrap(_)));
    assert!(!err.is_contract_violation());
    assert!(!wizard.is_initialized());
    assert!(wizard.active_step().is_none());
}

#[test]
fn test_start_after_initialize_does_not_touch_provider() {
    let mut provider = MockStepProvider::new();
    provider.expect_bootstrap().times(0);

    let wizard = WizardController::new("Import Data");
    wizard.initialize(ScriptedStep::new("Select source")).unwrap();

    let err = wizard.start(&provider).unwrap_err();
    assert!(matches!(err, WizardError::AlreadyInitialized));
}

#[tokio::test]
async fn test_busy_is_set_while_resolving_and_released_after_failure() {
    let wizard = WizardController::new("Import Data");
    let probe = ProbeStep::new(wizard.subscribe_flags(), Err(anyhow!("parse error")));
    wizard.initialize(probe.clone()).unwrap();

    let err = wizard.next().await.unwrap_err();

    assert_eq!(probe.busy_during_resolution.get(), Some(true));
    assert!(!wizard.is_busy());
    assert!(!wizard.subscribe_flags().borrow().is_busy);
    match err {
        WizardError::StepResolution { step, source } => {
            assert_eq!(step, "Probe");
            assert_eq!(source.to_string(), "parse error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(wizard.active_step().unwrap().title(), "Probe");
    assert_eq!(wizard.history_depth(), 0);
    assert_eq!(wizard.stats().failures, 1);
}

#[tokio::test]
async fn test_has_next_changes_follow_only_the_active_step() {
    let flow = chain(&["Select source", "Map fields"]);
    let first = Rc::clone(flow.step(0).unwrap());
    let second = Rc::clone(flow.step(1).unwrap());

    let wizard = WizardController::new("Import Data");
    wizard.start(&flow).unwrap();
    let mut flags = wizard.subscribe_flags();

    first.set_has_next(false);
    assert!(!wizard.can_next());
    assert!(flags.has_changed().unwrap());
    assert!(!flags.borrow_and_update().can_next);

    first.set_has_next(true);
    assert_eq!(wizard.next().await.unwrap(), NextOutcome::Advanced);
    assert!(wizard.can_next());

    // `first` is in history now; its signal no longer drives the wizard
    first.set_has_next(false);
    assert!(wizard.can_next());
    assert_eq!(first.has_next().listener_count(), 0);
    assert_eq!(second.has_next().listener_count(), 1);

    second.set_has_next(false);
    assert!(!wizard.can_next());
}

#[tokio::test]
async fn test_activation_hooks_follow_navigation() {
    let flow = chain(&["Select source", "Map fields"]);
    let first = Rc::clone(flow.step(0).unwrap());
    let second = Rc::clone(flow.step(1).unwrap());

    let wizard = WizardController::new("Import Data");
    wizard.start(&flow).unwrap();
    assert_eq!(first.activations(), 1);

    wizard.next().await.unwrap();
    assert_eq!(first.deactivations(), 1);
    assert_eq!(second.activations(), 1);

    wizard.previous().unwrap();
    assert_eq!(second.deactivations(), 1);
    assert_eq!(first.activations(), 2);

    wizard.next().await.unwrap();
    assert_eq!(second.activations(), 2);
}

#[tokio::test]
async fn test_previous_during_resolution_supersedes_it() {
    let flow = chain(&["Select source", "Map fields", "Confirm"]);
    let wizard = WizardController::new("Import Data");
    wizard.start(&flow).unwrap();
    wizard.next().await.unwrap();
    flow.step(1).unwrap().set_delay(Some(Duration::from_millis(50)));

    let back = async {
        tokio::task::yield_now().await;
        wizard.previous()
    };
    let (forward, backward) = tokio::join!(wizard.next(), back);

    assert_eq!(backward.unwrap(), PreviousOutcome::Restored);
    assert_eq!(forward.unwrap(), NextOutcome::Superseded);
    assert_eq!(wizard.active_step().unwrap().title(), "Select source");
    assert_eq!(wizard.history_depth(), 0);
    assert!(!wizard.is_busy());
    assert_eq!(wizard.stats().superseded, 1);
}

#[tokio::test]
async fn test_close_discards_in_flight_resolution() {
    let flow = chain(&["Select source", "Map fields"]);
    let first = Rc::clone(flow.step(0).unwrap());
    first.set_delay(Some(Duration::from_millis(20)));

    let wizard = WizardController::new("Import Data");
    wizard.start(&flow).unwrap();

    let close = async {
        tokio::task::yield_now().await;
        wizard.close();
    };
    let (forward, ()) = tokio::join!(wizard.next(), close);

    assert_eq!(forward.unwrap(), NextOutcome::Superseded);
    assert!(wizard.is_closed());
    assert!(!wizard.is_busy());
    assert!(wizard.active_step().is_none());
    assert_eq!(first.has_next().listener_count(), 0);
    assert_eq!(first.deactivations(), 1);
    assert_eq!(wizard.flags(), NavigationFlags::default());
}

#[tokio::test]
async fn test_wait_idle_returns_after_resolution() {
    let flow = chain(&["Select source", "Map fields"]);
    flow.step(0).unwrap().set_delay(Some(Duration::from_millis(10)));

    let wizard = WizardController::new("Import Data");
    wizard.start(&flow).unwrap();

    let waiter = async {
        tokio::task::yield_now().await;
        assert!(wizard.is_busy());
        wizard.wait_idle().await;
        wizard.is_busy()
    };
    let (outcome, busy_after_wait) = tokio::join!(wizard.next(), waiter);

    assert_eq!(outcome.unwrap(), NextOutcome::Advanced);
    assert!(!busy_after_wait);
}

#[tokio::test]
async fn test_generation_increases_on_every_activation() {
    let flow = chain(&["Select source", "Map fields"]);
    let wizard = WizardController::new("Import Data");
    assert_eq!(wizard.generation(), 0);

    wizard.start(&flow).unwrap();
    assert_eq!(wizard.generation(), 1);

    wizard.next().await.unwrap();
    assert_eq!(wizard.generation(), 2);

    wizard.previous().unwrap();
    assert_eq!(wizard.generation(), 3);

    // No-ops do not stamp a new generation
    wizard.previous().unwrap();
    assert_eq!(wizard.generation(), 3);
}

#[test]
fn test_debug_output_names_active_step() {
    let wizard = WizardController::new("Import Data");
    wizard.initialize(ScriptedStep::new("Select source")).unwrap();

    let rendered = format!("{wizard:?}");
    assert!(rendered.contains("Import Data"));
    assert!(rendered.contains("Select source"));
}

#[tokio::test]
async fn test_navigating_from_a_has_next_listener_keeps_flags_on_active_step() {
    let flow = chain(&["Select source", "Map fields"]);
    let first = Rc::clone(flow.step(0).unwrap());
    let second = Rc::clone(flow.step(1).unwrap());

    let wizard = WizardController::new("Import Data");

    // Registered before the controller's own listener, so it runs first
    let host = wizard.clone();
    let _host_listener = second.has_next().subscribe(move |has_next| {
        if !*has_next {
            host.previous().unwrap();
        }
    });

    wizard.start(&flow).unwrap();
    assert_eq!(wizard.next().await.unwrap(), NextOutcome::Advanced);

    second.set_has_next(false);

    assert_eq!(wizard.active_step().unwrap().title(), "Select source");
    assert!(first.has_next().get());
    assert!(wizard.can_next());
    assert!(wizard.subscribe_flags().borrow().can_next);
    assert_eq!(first.has_next().listener_count(), 1);
    assert_eq!(second.has_next().listener_count(), 1);
}

#[tokio::test]
async fn test_step_resolving_to_itself_keeps_one_subscription() {
    let step = ScriptedStep::new("Review rows");
    let successor: StepRef = step.clone();
    step.set_successor(Some(successor));

    let wizard = WizardController::new("Import Data");
    wizard.initialize(step.clone()).unwrap();
    assert_eq!(wizard.next().await.unwrap(), NextOutcome::Advanced);

    assert_eq!(wizard.history_depth(), 1);
    assert_eq!(step.has_next().listener_count(), 1);

    step.set_has_next(false);
    assert!(!wizard.can_next());
    step.set_has_next(true);
    assert!(wizard.can_next());

    // Break the self-reference so the step can be freed
    step.set_successor(None);
}
