//! Time source for cache expiry.
//!
//! Expiry is measured on a monotonic clock so wall-clock steps (NTP, DST,
//! manual changes) never stretch or shrink an entry's lifetime.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of the current monotonic instant for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Process clock. Reads through tokio so paused test runtimes control it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// A clock that only moves forward when told to. Used to drive expiry in tests.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    /// Time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}
