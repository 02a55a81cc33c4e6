use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Navigation counters for one wizard controller
#[derive(Debug, Default)]
pub struct NavigationMetrics {
    pub forward: AtomicU64,
    pub backward: AtomicU64,
    pub finished: AtomicU64,
    pub rejected: AtomicU64,
    pub ignored: AtomicU64,
    pub superseded: AtomicU64,
    pub failures: AtomicU64,
}

impl NavigationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_forward(&self) {
        self.forward.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backward(&self) {
        self.backward.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_finished(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> NavigationStats {
        NavigationStats {
            forward: self.forward.load(Ordering::Relaxed),
            backward: self.backward.load(Ordering::Relaxed),
            finished: self.finished.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            forward = stats.forward,
            backward = stats.backward,
            finished = stats.finished,
            rejected = stats.rejected,
            ignored = stats.ignored,
            superseded = stats.superseded,
            failures = stats.failures,
            "Wizard navigation metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationStats {
    pub forward: u64,
    pub backward: u64,
    pub finished: u64,
    pub rejected: u64,
    pub ignored: u64,
    pub superseded: u64,
    pub failures: u64,
}

/// Create a span carrying the wizard id for all of its transitions
pub fn create_wizard_span(title: &str, wizard_id: &str) -> tracing::Span {
    tracing::info_span!(
        "wizard",
        wizard.title = title,
        wizard.id = wizard_id,
        otel.kind = "internal"
    )
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        debug!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
        duration
    }
}
