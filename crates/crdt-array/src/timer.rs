//! Deadline bookkeeping for cooperative background tasks.
//!
//! Nothing here sleeps or spawns. A [`Timer`] or [`Interval`] just remembers
//! when its task is due; the owning document checks them in
//! [`Document::tick`](crate::Document::tick) and a host decides when to call
//! that, using [`Document::next_deadline`](crate::Document::next_deadline).

/// A one-shot timer that can be re-armed, e.g. for debouncing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<u64>,
}

impl Timer {
    /// An unarmed timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer to fire `delay` ms after `now`.
    pub fn schedule(&mut self, now: u64, delay: u64) {
        self.deadline = Some(now.saturating_add(delay));
    }

    /// Disarm the timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// When the timer fires, if armed.
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Whether the timer is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the timer is armed and its deadline has passed.
    #[must_use]
    pub fn is_due(&self, now: u64) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Disarm and return `true` if the timer was due.
    pub fn fire(&mut self, now: u64) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.deadline = None;
        true
    }
}

/// A periodic timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period: u64,
    next: Option<u64>,
}

impl Interval {
    /// A stopped interval with the given period in ms.
    #[must_use]
    pub fn new(period: u64) -> Self {
        Self { period, next: None }
    }

    /// The period in ms.
    #[must_use]
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Start ticking from `now`. Does nothing if already running.
    pub fn start(&mut self, now: u64) {
        if self.next.is_none() {
            self.next = Some(now.saturating_add(self.period));
        }
    }

    /// Stop ticking.
    pub fn stop(&mut self) {
        self.next = None;
    }

    /// Whether the interval is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// The next time the interval fires, if running.
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.next
    }

    /// Return `true` if due, scheduling the next period from `now`.
    pub fn fire(&mut self, now: u64) -> bool {
        match self.next {
            Some(next) if now >= next => {
                self.next = Some(now.saturating_add(self.period));
                true
            }
            _ => false,
        }
    }
}
