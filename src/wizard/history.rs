use std::fmt;
use std::rc::Rc;

use crate::wizard::step::StepRef;

/// LIFO record of previously active steps.
///
/// Only the controller mutates it; outside the crate it is read-only.
#[derive(Default)]
pub struct StepHistory {
    steps: Vec<StepRef>,
}

impl StepHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, step: StepRef) {
        self.steps.push(step);
    }

    pub(crate) fn pop(&mut self) -> Option<StepRef> {
        self.steps.pop()
    }

    #[cfg(test)]
    fn peek(&self) -> Option<&StepRef> {
        self.steps.last()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, step: &StepRef) -> bool {
        self.steps.iter().any(|s| Rc::ptr_eq(s, step))
    }

    /// Titles from oldest to most recent
    pub fn titles(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.title().to_string()).collect()
    }
}

impl fmt::Debug for StepHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.titles()).finish()
    }
}
