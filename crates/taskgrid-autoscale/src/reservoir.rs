//! Sliding-window maximum over recent demand samples.
//!
//! Scaling on the maximum of the last few samples keeps the pool from
//! shrinking on a single quiet tick. Samples above the admission ceiling are
//! treated as outliers and dropped without occupying a slot.

use std::collections::VecDeque;

use tracing::warn;

/// Bounded FIFO of demand samples reporting the maximum retained value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindowReservoir {
    samples: VecDeque<u64>,
    capacity: usize,
    admission_ceiling: u64,
}

impl SlidingWindowReservoir {
    /// Create a window holding at most `capacity` samples, each at most
    /// `admission_ceiling`. A capacity of zero is treated as one.
    pub fn new(capacity: usize, admission_ceiling: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
            admission_ceiling,
        }
    }

    /// A window with no admission ceiling.
    pub fn unbounded(capacity: usize) -> Self {
        Self::new(capacity, u64::MAX)
    }

    /// A window that only remembers the latest sample (damping disabled).
    pub fn noop() -> Self {
        Self::unbounded(1)
    }

    /// Admit a sample. Returns `false` if it was rejected by the ceiling.
    pub fn add(&mut self, value: u64) -> bool {
        if value > self.admission_ceiling {
            warn!(
                value,
                ceiling = self.admission_ceiling,
                "demand sample above admission ceiling, ignoring"
            );
            return false;
        }

        self.samples.push_back(value);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        true
    }

    /// Maximum of the retained samples, or `None` before the first admitted sample.
    pub fn max(&self) -> Option<u64> {
        self.samples.iter().copied().max()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn admission_ceiling(&self) -> u64 {
        self.admission_ceiling
    }
}

impl Default for SlidingWindowReservoir {
    fn default() -> Self {
        Self::noop()
    }
}
