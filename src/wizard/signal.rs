// Observable values with explicit subscribe/unsubscribe

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct Registration<T> {
    id: u64,
    live: Rc<Cell<bool>>,
    listener: Listener<T>,
}

struct SignalInner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<Registration<T>>>,
    next_id: Cell<u64>,
}

/// A single-threaded observable value.
///
/// Steps expose their `has_next` capability through a `Signal<bool>`; the
/// controller subscribes to the active step's signal and keeps exactly one
/// live [`Subscription`] at a time.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Store a new value. Listeners run only when the value actually changed.
    /// Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }

        // Snapshot so listeners may subscribe or unsubscribe while we notify.
        // A listener released by an earlier one in this round is skipped.
        let listeners: Vec<(Rc<Cell<bool>>, Listener<T>)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|reg| (Rc::clone(&reg.live), Rc::clone(&reg.listener)))
            .collect();

        for (live, listener) in listeners {
            if live.get() {
                listener(&value);
            }
        }
        true
    }

    /// Register a listener. It stays registered until the returned
    /// subscription is dropped or unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let live = Rc::new(Cell::new(true));
        self.inner.listeners.borrow_mut().push(Registration {
            id,
            live: Rc::clone(&live),
            listener: Rc::new(listener),
        });

        let weak: Weak<SignalInner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                live.set(false);
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.borrow_mut().retain(|reg| reg.id != id);
                }
            })),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

/// Handle for a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes the listener immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("live", &self.release.is_some())
            .finish()
    }
}
