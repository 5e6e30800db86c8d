//! Periodic removal of old tombstones.

use crate::item::Item;
use crate::sequence::Sequence;
use crate::timer::Interval;

/// Default time between collection passes: 5 minutes.
pub const DEFAULT_GC_INTERVAL_MS: u64 = 5 * 60 * 1000;

/// Default tombstone retention: 1 hour.
pub const DEFAULT_GC_MAX_AGE_MS: u64 = 60 * 60 * 1000;

/// Drops tombstones older than a retention window.
///
/// Live items and tombstones without a deletion time are always kept, so a
/// pass never changes what a container shows.
#[derive(Debug, Clone)]
pub struct GarbageCollector {
    max_age_ms: u64,
    interval: Interval,
}

impl Default for GarbageCollector {
    fn default() -> Self {
        Self::new(DEFAULT_GC_MAX_AGE_MS, DEFAULT_GC_INTERVAL_MS)
    }
}

impl GarbageCollector {
    /// A stopped collector.
    #[must_use]
    pub fn new(max_age_ms: u64, interval_ms: u64) -> Self {
        Self {
            max_age_ms,
            interval: Interval::new(interval_ms),
        }
    }

    /// Retention window in milliseconds.
    #[must_use]
    pub fn max_age_ms(&self) -> u64 {
        self.max_age_ms
    }

    /// Start periodic passes. Idempotent.
    pub fn start(&mut self, now: u64) {
        self.interval.start(now);
    }

    /// Stop periodic passes.
    pub fn stop(&mut self) {
        self.interval.stop();
    }

    /// Whether periodic passes are scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.interval.is_running()
    }

    /// Next scheduled pass, if running.
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.interval.deadline()
    }

    /// Return `true` if a periodic pass is due, rescheduling the next one.
    pub fn fire(&mut self, now: u64) -> bool {
        self.interval.fire(now)
    }

    /// Whether `item` survives a pass at time `now`.
    #[must_use]
    pub fn retains<T>(&self, item: &Item<T>, now: u64) -> bool {
        match item.deleted_at() {
            Some(at) if item.is_deleted() => now.saturating_sub(at) < self.max_age_ms,
            _ => true,
        }
    }

    /// Run one pass over `containers`, returning how many items were dropped.
    pub fn collect<'a, T, I>(&self, containers: I, now: u64) -> usize
    where
        T: 'a,
        I: IntoIterator<Item = &'a mut Sequence<T>>,
    {
        containers
            .into_iter()
            .map(|seq| seq.retain(|item| self.retains(item, now)))
            .sum()
    }
}
