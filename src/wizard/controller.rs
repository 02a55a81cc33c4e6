// Wizard navigation controller
//
// Owns the single active step, the back-navigation history and the derived
// flags. Everything runs on one ordering domain: the controller is `!Send`,
// and `is_busy` is a cooperative guard, not a lock. No `RefCell` borrow is
// held across an await or while step code runs.

use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument, Span};
use uuid::Uuid;

use crate::config::WizardConfig;
use crate::observability::{create_wizard_span, NavigationMetrics, NavigationStats, OperationTimer};
use crate::wizard::error::WizardError;
use crate::wizard::history::StepHistory;
use crate::wizard::signal::Subscription;
use crate::wizard::step::{StepProvider, StepRef};

/// Capability flags surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NavigationFlags {
    pub can_next: bool,
    pub can_previous: bool,
    pub is_busy: bool,
}

/// Result of a forward navigation request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOutcome {
    /// The successor became the active step
    Advanced,
    /// The active step has no successor; the workflow ends here
    Finished,
    /// The active step did not validate; nothing happened
    Invalid,
    /// Another forward navigation is in flight; nothing happened
    Busy,
    /// A backward navigation or close happened while resolving; the
    /// resolved step was discarded
    Superseded,
}

/// Result of a backward navigation request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousOutcome {
    Restored,
    HistoryEmpty,
}

struct NavState {
    active: Option<StepRef>,
    history: StepHistory,
    is_busy: bool,
    can_next: bool,
    subscription: Option<Subscription>,
    initialized: bool,
    closed: bool,
}

impl NavState {
    fn ensure_usable(&self) -> Result<(), WizardError> {
        if self.closed {
            Err(WizardError::Closed)
        } else if !self.initialized {
            Err(WizardError::NotInitialized)
        } else {
            Ok(())
        }
    }

    fn flags(&self) -> NavigationFlags {
        NavigationFlags {
            can_next: self.active.is_some() && self.can_next,
            can_previous: !self.history.is_empty(),
            is_busy: self.is_busy,
        }
    }
}

struct ControllerInner {
    id: Uuid,
    title: String,
    state: RefCell<NavState>,
    generation: Cell<u64>,
    flags: watch::Sender<NavigationFlags>,
    metrics: NavigationMetrics,
    span: Span,
}

impl ControllerInner {
    /// Push the current flags to subscribers if they changed
    fn publish(&self) {
        let flags = self.state.borrow().flags();
        self.flags.send_if_modified(|current| {
            if *current == flags {
                false
            } else {
                *current = flags;
                true
            }
        });
    }

    fn bump_generation(&self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        generation
    }

    /// `generation` is the activation the listener was registered under
    fn on_has_next_changed(&self, generation: u64, has_next: bool) {
        if self.generation.get() != generation {
            debug!(parent: &self.span, generation, "Ignoring has_next from an inactive step");
            return;
        }
        self.state.borrow_mut().can_next = has_next;
        debug!(parent: &self.span, has_next, "Active step changed has_next");
        self.publish();
    }
}

/// Releases `is_busy` on every exit path of a forward navigation
struct BusyGuard<'a> {
    inner: &'a ControllerInner,
}

impl<'a> BusyGuard<'a> {
    fn acquire(inner: &'a ControllerInner) -> Option<Self> {
        {
            let mut state = inner.state.borrow_mut();
            if state.is_busy {
                return None;
            }
            state.is_busy = true;
        }
        inner.publish();
        Some(Self { inner })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.inner.state.borrow_mut().is_busy = false;
        self.inner.publish();
    }
}

/// Drives one linear wizard: activation, history and derived flags.
///
/// Cloning yields another handle to the same wizard.
#[derive(Clone)]
pub struct WizardController {
    inner: Rc<ControllerInner>,
}

impl WizardController {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let id = Uuid::new_v4();
        let span = create_wizard_span(&title, &id.to_string());
        let (flags, _) = watch::channel(NavigationFlags::default());

        Self {
            inner: Rc::new(ControllerInner {
                id,
                title,
                state: RefCell::new(NavState {
                    active: None,
                    history: StepHistory::new(),
                    is_busy: false,
                    can_next: false,
                    subscription: None,
                    initialized: false,
                    closed: false,
                }),
                generation: Cell::new(0),
                flags,
                metrics: NavigationMetrics::new(),
                span,
            }),
        }
    }

    pub fn from_config(config: &WizardConfig) -> Self {
        Self::new(config.display_name.clone())
    }

    /// Make `step` the first active step. No history entry is created.
    pub fn initialize(&self, step: StepRef) -> Result<(), WizardError> {
        let inner = &*self.inner;
        let _span = inner.span.enter();
        {
            let mut state = inner.state.borrow_mut();
            if state.closed {
                return Err(WizardError::Closed);
            }
            if state.initialized {
                warn!(step = step.title(), "Wizard initialized twice");
                return Err(WizardError::AlreadyInitialized);
            }
            state.initialized = true;
            state.active = Some(Rc::clone(&step));
        }

        let generation = inner.bump_generation();
        self.exchange_subscription(&step);
        step.activated();
        inner.publish();

        info!(step = step.title(), generation, "Wizard initialized");
        Ok(())
    }

    /// Initialize with the bootstrap step of `provider`
    pub fn start(&self, provider: &dyn StepProvider) -> Result<(), WizardError> {
        {
            let state = self.inner.state.borrow();
            if state.closed {
                return Err(WizardError::Closed);
            }
            if state.initialized {
                return Err(WizardError::AlreadyInitialized);
            }
        }
        let step = provider.bootstrap().map_err(WizardError::Bootstrap)?;
        self.initialize(step)
    }

    /// Validate the active step, resolve its successor and activate it.
    pub async fn next(&self) -> Result<NextOutcome, WizardError> {
        let span = self.inner.span.clone();
        self.resolve_next().instrument(span).await
    }

    async fn resolve_next(&self) -> Result<NextOutcome, WizardError> {
        let inner = &*self.inner;
        let step = {
            let state = inner.state.borrow();
            state.ensure_usable()?;
            if state.is_busy {
                debug!("Forward navigation already in flight; ignoring");
                inner.metrics.record_ignored();
                return Ok(NextOutcome::Busy);
            }
            state.active.clone()
        };
        let Some(step) = step else {
            return Err(WizardError::NotInitialized);
        };
        let generation = inner.generation.get();

        if !step.validate() {
            debug!(step = step.title(), "Step did not validate; staying");
            inner.metrics.record_rejected();
            return Ok(NextOutcome::Invalid);
        }

        let Some(_busy) = BusyGuard::acquire(inner) else {
            inner.metrics.record_ignored();
            return Ok(NextOutcome::Busy);
        };

        let timer = OperationTimer::new("resolve_next_step");
        let resolved = step.next().await;
        timer.finish();

        if inner.generation.get() != generation {
            debug!(
                step = step.title(),
                expected = generation,
                current = inner.generation.get(),
                "Discarding stale step resolution"
            );
            inner.metrics.record_superseded();
            return Ok(NextOutcome::Superseded);
        }

        match resolved {
            Ok(Some(successor)) => {
                self.advance(step, successor);
                Ok(NextOutcome::Advanced)
            }
            Ok(None) => {
                info!(step = step.title(), "Reached terminal step");
                inner.metrics.record_finished();
                Ok(NextOutcome::Finished)
            }
            Err(source) => {
                warn!(step = step.title(), error = %source, "Step failed to resolve its successor");
                inner.metrics.record_failure();
                Err(WizardError::StepResolution {
                    step: step.title().to_string(),
                    source,
                })
            }
        }
    }

    /// Forward activation: push `from`, activate `to`
    fn advance(&self, from: StepRef, to: StepRef) {
        let inner = &*self.inner;
        let depth = {
            let mut state = inner.state.borrow_mut();
            state.history.push(Rc::clone(&from));
            state.active = Some(Rc::clone(&to));
            state.history.len()
        };

        let generation = inner.bump_generation();
        self.exchange_subscription(&to);
        from.deactivated();
        to.activated();
        inner.publish();
        inner.metrics.record_forward();

        info!(
            from = from.title(),
            to = to.title(),
            history_depth = depth,
            generation,
            "Advanced to next step"
        );
    }

    /// Restore the most recent history entry. The step being left is
    /// discarded, never pushed back.
    pub fn previous(&self) -> Result<PreviousOutcome, WizardError> {
        let inner = &*self.inner;
        let _span = inner.span.enter();
        let (leaving, restored, depth) = {
            let mut state = inner.state.borrow_mut();
            state.ensure_usable()?;
            let Some(restored) = state.history.pop() else {
                debug!("History is empty; ignoring backward navigation");
                inner.metrics.record_ignored();
                return Ok(PreviousOutcome::HistoryEmpty);
            };
            let leaving = state.active.replace(Rc::clone(&restored));
            (leaving, restored, state.history.len())
        };

        let generation = inner.bump_generation();
        self.exchange_subscription(&restored);
        if let Some(leaving) = &leaving {
            leaving.deactivated();
        }
        restored.activated();
        inner.publish();
        inner.metrics.record_backward();

        info!(
            from = leaving.as_ref().map(|s| s.title()),
            to = restored.title(),
            history_depth = depth,
            generation,
            "Returned to previous step"
        );
        Ok(PreviousOutcome::Restored)
    }

    /// Drop the old `has_next` listener, then listen to `step`.
    /// Callers bump the generation first.
    fn exchange_subscription(&self, step: &StepRef) {
        let previous = self.inner.state.borrow_mut().subscription.take();
        drop(previous);

        let weak: Weak<ControllerInner> = Rc::downgrade(&self.inner);
        let generation = self.inner.generation.get();
        let subscription = step.has_next().subscribe(move |has_next| {
            if let Some(inner) = weak.upgrade() {
                inner.on_has_next_changed(generation, *has_next);
            }
        });
        let has_next = step.has_next().get();

        let mut state = self.inner.state.borrow_mut();
        state.subscription = Some(subscription);
        state.can_next = has_next;
    }

    /// Tear the wizard down. In-flight resolutions are discarded when they
    /// complete; later navigation calls fail with [`WizardError::Closed`].
    pub fn close(&self) {
        let inner = &*self.inner;
        let _span = inner.span.enter();
        let (subscription, active, history) = {
            let mut state = inner.state.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            state.can_next = false;
            (
                state.subscription.take(),
                state.active.take(),
                std::mem::take(&mut state.history),
            )
        };

        let generation = inner.bump_generation();
        drop(subscription);
        if let Some(active) = &active {
            active.deactivated();
        }
        drop(history);
        inner.publish();

        inner.metrics.log_stats();
        info!(generation, "Wizard closed");
    }

    /// Wait until no forward navigation is in flight
    pub async fn wait_idle(&self) {
        let mut flags = self.inner.flags.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = flags.wait_for(|flags| !flags.is_busy).await;
    }

    /// Receiver for flag changes. Holds the latest value at all times.
    pub fn subscribe_flags(&self) -> watch::Receiver<NavigationFlags> {
        self.inner.flags.subscribe()
    }

    pub fn flags(&self) -> NavigationFlags {
        self.inner.state.borrow().flags()
    }

    pub fn can_next(&self) -> bool {
        self.flags().can_next
    }

    pub fn can_previous(&self) -> bool {
        self.flags().can_previous
    }

    pub fn is_busy(&self) -> bool {
        self.inner.state.borrow().is_busy
    }

    pub fn active_step(&self) -> Option<StepRef> {
        self.inner.state.borrow().active.clone()
    }

    pub fn history_depth(&self) -> usize {
        self.inner.state.borrow().history.len()
    }

    pub fn history_contains(&self, step: &StepRef) -> bool {
        self.inner.state.borrow().history.contains(step)
    }

    /// History titles, oldest first
    pub fn history_titles(&self) -> Vec<String> {
        self.inner.state.borrow().history.titles()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state.borrow().initialized
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.borrow().closed
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn stats(&self) -> NavigationStats {
        self.inner.metrics.get_stats()
    }
}

impl fmt::Debug for WizardController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("WizardController")
            .field("id", &self.inner.id)
            .field("title", &self.inner.title)
            .field("active", &state.active.as_ref().map(|s| s.title().to_string()))
            .field("history", &state.history)
            .field("flags", &state.flags())
            .field("generation", &self.inner.generation.get())
            .finish()
    }
}
