//! Global atomic counters for admin actions.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when the CLI exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    actions_dispatched: AtomicU64,
    actions_denied: AtomicU64,
    entities_created: AtomicU64,
    partial_bundles: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            actions_dispatched: AtomicU64::new(0),
            actions_denied: AtomicU64::new(0),
            entities_created: AtomicU64::new(0),
            partial_bundles: AtomicU64::new(0),
        }
    }

    pub fn inc_dispatched(&self) {
        self.actions_dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "actions_dispatched", "counter incremented");
    }

    pub fn inc_denied(&self) {
        self.actions_denied.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "actions_denied", "counter incremented");
    }

    /// Count one committed entity (task, dataset or evaluator).
    pub fn inc_created(&self) {
        self.entities_created.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "entities_created", "counter incremented");
    }

    pub fn inc_partial(&self) {
        self.partial_bundles.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "partial_bundles", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            actions_dispatched = self.actions_dispatched(),
            actions_denied = self.actions_denied(),
            entities_created = self.entities_created(),
            partial_bundles = self.partial_bundles(),
        );
    }

    pub fn actions_dispatched(&self) -> u64 {
        self.actions_dispatched.load(Ordering::Relaxed)
    }

    pub fn actions_denied(&self) -> u64 {
        self.actions_denied.load(Ordering::Relaxed)
    }

    pub fn entities_created(&self) -> u64 {
        self.entities_created.load(Ordering::Relaxed)
    }

    pub fn partial_bundles(&self) -> u64 {
        self.partial_bundles.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.actions_dispatched.store(0, Ordering::Relaxed);
        self.actions_denied.store(0, Ordering::Relaxed);
        self.entities_created.store(0, Ordering::Relaxed);
        self.partial_bundles.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.actions_dispatched(), 0);
        m.inc_dispatched();
        m.inc_dispatched();
        assert_eq!(m.actions_dispatched(), 2);

        m.inc_denied();
        assert_eq!(m.actions_denied(), 1);

        m.inc_created();
        m.inc_created();
        m.inc_created();
        assert_eq!(m.entities_created(), 3);

        m.inc_partial();
        assert_eq!(m.partial_bundles(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_dispatched();
        m.inc_denied();
        m.inc_created();
        m.inc_partial();
        m.reset();
        assert_eq!(m.actions_dispatched(), 0);
        assert_eq!(m.actions_denied(), 0);
        assert_eq!(m.entities_created(), 0);
        assert_eq!(m.partial_bundles(), 0);
    }
}
