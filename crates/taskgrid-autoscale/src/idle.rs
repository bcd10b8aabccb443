//! Idle tracking for worker instances.
//!
//! Each known instance carries the last time it was seen holding at least one
//! partition. Instances that have never been active are stamped on first
//! observation, so they get a full tolerance window before being reported as
//! scale-down candidates.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use tracing::debug;

use taskgrid_state::InstanceId;

/// Per-instance last-active timestamps and the idle tolerance.
#[derive(Debug, Clone)]
pub struct IdleTracker {
    last_active: HashMap<InstanceId, Instant>,
    tolerance: Duration,
}

impl IdleTracker {
    pub fn new(tolerance: Duration) -> Self {
        Self {
            last_active: HashMap::new(),
            tolerance,
        }
    }

    /// Mark an instance as holding work at `now`.
    pub fn record_activity(&mut self, instance: &str, now: Instant) {
        self.last_active.insert(instance.to_string(), now);
    }

    /// Start the idle clock for an instance seen for the first time.
    ///
    /// Does nothing if the instance already has an entry.
    pub fn observe(&mut self, instance: &str, now: Instant) {
        if !self.last_active.contains_key(instance) {
            debug!(%instance, "instance first observed idle");
            self.last_active.insert(instance.to_string(), now);
        }
    }

    /// Whether an instance has been idle for at least the tolerance.
    ///
    /// Instances without an entry are never unused.
    pub fn is_unused(&self, instance: &str, now: Instant) -> bool {
        self.last_active
            .get(instance)
            .is_some_and(|since| now.saturating_duration_since(*since) >= self.tolerance)
    }

    pub fn last_active(&self, instance: &str) -> Option<Instant> {
        self.last_active.get(instance).copied()
    }

    /// Drop entries for instances no longer in the cluster.
    ///
    /// Returns how many entries were removed.
    pub fn retain_known(&mut self, known: &BTreeSet<InstanceId>) -> usize {
        let before = self.last_active.len();
        self.last_active.retain(|id, _| known.contains(id));
        let removed = before - self.last_active.len();
        if removed > 0 {
            debug!(removed, "pruned idle history for departed instances");
        }
        removed
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    pub fn len(&self) -> usize {
        self.last_active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: Duration = Duration::from_secs(600);

    #[test]
    fn unknown_instance_is_not_unused() {
        let tracker = IdleTracker::new(TOLERANCE);
        let now = Instant::now();
        assert!(!tracker.is_unused("worker-1", now + Duration::from_secs(86_400)));
    }

    #[test]
    fn active_instance_stays_in_use_within_tolerance() {
        let mut tracker = IdleTracker::new(TOLERANCE);
        let t0 = Instant::now();
        tracker.record_activity("worker-1", t0);

        assert!(!tracker.is_unused("worker-1", t0));
        assert!(!tracker.is_unused("worker-1", t0 + Duration::from_secs(599)));
    }

    #[test]
    fn becomes_unused_at_tolerance() {
        let mut tracker = IdleTracker::new(TOLERANCE);
        let t0 = Instant::now();
        tracker.record_activity("worker-1", t0);

        assert!(tracker.is_unused("worker-1", t0 + TOLERANCE));
        assert!(tracker.is_unused("worker-1", t0 + Duration::from_secs(3600)));
    }

    #[test]
    fn activity_refreshes_timestamp() {
        let mut tracker = IdleTracker::new(TOLERANCE);
        let t0 = Instant::now();
        tracker.record_activity("worker-1", t0);
        tracker.record_activity("worker-1", t0 + Duration::from_secs(500));

        assert!(!tracker.is_unused("worker-1", t0 + Duration::from_secs(700)));
        assert_eq!(
            tracker.last_active("worker-1"),
            Some(t0 + Duration::from_secs(500))
        );
    }

    #[test]
    fn observe_starts_grace_period_once() {
        let mut tracker = IdleTracker::new(TOLERANCE);
        let t0 = Instant::now();

        tracker.observe("worker-2", t0);
        assert!(!tracker.is_unused("worker-2", t0));

        // A later observation must not push the idle clock forward.
        tracker.observe("worker-2", t0 + Duration::from_secs(300));
        assert_eq!(tracker.last_active("worker-2"), Some(t0));
        assert!(tracker.is_unused("worker-2", t0 + TOLERANCE));
    }

    #[test]
    fn observe_does_not_override_activity() {
        let mut tracker = IdleTracker::new(TOLERANCE);
        let t0 = Instant::now();
        tracker.record_activity("worker-1", t0 + Duration::from_secs(100));
        tracker.observe("worker-1", t0 + Duration::from_secs(200));
        assert_eq!(
            tracker.last_active("worker-1"),
            Some(t0 + Duration::from_secs(100))
        );
    }

    #[test]
    fn retain_known_prunes_departed() {
        let mut tracker = IdleTracker::new(TOLERANCE);
        let t0 = Instant::now();
        tracker.record_activity("worker-1", t0);
        tracker.record_activity("worker-2", t0);

        let known: BTreeSet<InstanceId> = ["worker-1".to_string()].into();
        assert_eq!(tracker.retain_known(&known), 1);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.last_active("worker-2").is_none());
    }
}
