//! Physical time sources.
//!
//! Documents read the current time when they stamp deletions and when they
//! decide whether a batch flush or a garbage collection pass is due. The
//! source is injectable so hosts and tests can drive time themselves.
//!
//! # Example
//!
//! ```
//! use crdt_array::clock::{ManualClock, TimeSource};
//!
//! let clock = ManualClock::new(1_000);
//! let handle = clock.clone();
//!
//! handle.advance(50);
//! assert_eq!(clock.now_ms(), 1_050);
//! ```

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

/// A source of milliseconds.
///
/// Plain functions and closures returning `u64` are time sources too.
pub trait TimeSource {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

impl<F: Fn() -> u64> TimeSource for F {
    fn now_ms(&self) -> u64 {
        self()
    }
}

/// Milliseconds since the Unix epoch from `SystemTime`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// hand the other to a document.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start` milliseconds.
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    /// Move forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(not(feature = "std"))]
fn fallback_time_ms() -> u64 {
    0 // In no_std, callers must provide a time source
}

/// The time source a document uses when none is configured.
pub(crate) fn default_source() -> Arc<dyn TimeSource> {
    #[cfg(feature = "std")]
    {
        Arc::new(SystemClock)
    }
    #[cfg(not(feature = "std"))]
    {
        Arc::new(fallback_time_ms)
    }
}
