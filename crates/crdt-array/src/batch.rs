//! Debounced grouping of local changes into [`Batch`]es.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::item::Item;
use crate::timer::Timer;
use crate::timestamp::ItemId;
use crate::update::Batch;
use crate::version::VersionVector;

/// Default debounce delay in milliseconds.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 50;

/// Collects the items touched by local mutations until the debounce delay
/// passes without further changes.
///
/// Registering an item that is already pending replaces the stored copy, so
/// a flush always carries the latest state (e.g. a tombstone set after the
/// insert was registered).
#[derive(Debug, Clone)]
pub struct BatchManager<T> {
    pending: BTreeMap<String, BTreeMap<ItemId, Item<T>>>,
    delay_ms: u64,
    timer: Timer,
}

impl<T> Default for BatchManager<T> {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_DELAY_MS)
    }
}

impl<T> BatchManager<T> {
    /// An idle manager that flushes `delay_ms` after the last change.
    #[must_use]
    pub fn new(delay_ms: u64) -> Self {
        Self {
            pending: BTreeMap::new(),
            delay_ms,
            timer: Timer::new(),
        }
    }

    /// The debounce delay in milliseconds.
    #[must_use]
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Record `item` as touched in `container` and restart the timer.
    pub fn register(&mut self, container: &str, item: Item<T>, now: u64) {
        self.pending
            .entry(String::from(container))
            .or_default()
            .insert(item.id().clone(), item);
        self.timer.schedule(now, self.delay_ms);
    }

    /// Whether the debounce delay has elapsed.
    #[must_use]
    pub fn is_due(&self, now: u64) -> bool {
        self.timer.is_due(now)
    }

    /// When the pending changes will be due, if any are pending.
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.timer.deadline()
    }

    /// Number of pending items across all containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain pending changes into a batch stamped with `vector`.
    ///
    /// Returns `None` when nothing was pending. The timer is disarmed either
    /// way.
    pub fn take(&mut self, vector: VersionVector) -> Option<Batch<T>> {
        self.timer.cancel();
        if self.pending.is_empty() {
            return None;
        }
        let mut batch = Batch::new(vector);
        for (container, items) in core::mem::take(&mut self.pending) {
            batch.containers.insert(container, items.into_values().collect());
        }
        Some(batch)
    }

    /// Cancel the timer and discard unflushed changes.
    pub fn clear(&mut self) {
        self.timer.cancel();
        self.pending.clear();
    }
}
