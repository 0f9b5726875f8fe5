// SPDX-License-Identifier: MIT
// Copyright (c) 2026 aof contributors

//! Clock abstraction for testable time handling.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A clock that provides both a monotonic instant (for TTL/interval math)
/// and a wall-clock UTC timestamp (for frontmatter/event timestamps).
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> Instant;
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for deterministic tests. `now()` and `utc_now()` advance together.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
    utc: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
            utc: Arc::new(Mutex::new(DateTime::<Utc>::UNIX_EPOCH)),
        }
    }

    /// Advance both the monotonic and wall clocks by `duration`.
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
        *self.utc.lock() += duration;
    }

    /// Pin the wall-clock time (monotonic clock is untouched).
    pub fn set_utc(&self, at: DateTime<Utc>) {
        *self.utc.lock() = at;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        *self.utc.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
