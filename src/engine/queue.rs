// src/engine/queue.rs

use std::collections::BTreeMap;

use tracing::debug;

/// Pending re-runs of plans triggered while they were already running.
///
/// Semantics:
/// - Each plan may have at most `max_runs` pending runs.
/// - Further triggers while the limit is reached are coalesced into the
///   pending ones (the watcher fires once per saved file; one rerun covers
///   any number of saves).
/// - When a run of a plan finishes, the runtime calls `take` to decide
///   whether a queued run should start right away.
#[derive(Debug)]
pub struct TriggerQueue {
    max_runs: usize,
    pending: BTreeMap<String, usize>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1, as a zero-length queue would drop
    /// every change made during a run.
    pub fn new(max_runs: usize) -> Self {
        Self {
            max_runs: max_runs.max(1),
            pending: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending runs for a plan.
    pub fn pending_for(&self, plan: &str) -> usize {
        self.pending.get(plan).copied().unwrap_or(0)
    }

    /// Record a trigger for a running plan.
    ///
    /// Returns `true` if a new pending run was added, `false` if it was
    /// coalesced into existing ones.
    pub fn record_trigger(&mut self, plan: &str) -> bool {
        let count = self.pending.entry(plan.to_string()).or_insert(0);
        if *count < self.max_runs {
            *count += 1;
            debug!(plan = %plan, pending = *count, "queued re-run of running plan");
            true
        } else {
            debug!(plan = %plan, pending = *count, "coalesced trigger into queued re-run");
            false
        }
    }

    /// Consume one pending run for `plan`, if any.
    pub fn take(&mut self, plan: &str) -> bool {
        match self.pending.get_mut(plan) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.pending.remove(plan);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_triggers_coalesce_at_capacity() {
        let mut q = TriggerQueue::new(1);
        assert!(q.record_trigger("watch:styles"));
        assert!(!q.record_trigger("watch:styles"));
        assert!(!q.record_trigger("watch:styles"));
        assert_eq!(q.pending_for("watch:styles"), 1);

        assert!(q.take("watch:styles"));
        assert!(!q.take("watch:styles"));
        assert!(q.is_empty());
    }

    #[test]
    fn plans_queue_independently() {
        let mut q = TriggerQueue::new(2);
        q.record_trigger("a");
        q.record_trigger("a");
        q.record_trigger("a");
        q.record_trigger("b");
        assert_eq!(q.pending_for("a"), 2);
        assert_eq!(q.pending_for("b"), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut q = TriggerQueue::new(0);
        assert!(q.record_trigger("a"));
    }
}
