#![forbid(unsafe_code)]

//! Timestamp sources.
//!
//! Every telemetry record carries wall-clock Unix milliseconds. The form asks
//! its [`Clock`] once per delivered event, so a deterministic clock gives
//! fully reproducible logs.

use web_time::{SystemTime, UNIX_EPOCH};

/// Source of Unix-millisecond timestamps.
pub trait Clock {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Wall clock. Works on native targets and on `wasm32` in the browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            // Clock set before 1970.
            Err(_) => 0,
        }
    }
}

/// Host-advanced clock for tests and replays.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ManualClock {
    now: u64,
}

impl ManualClock {
    /// Create a clock at `start` millis.
    #[must_use]
    pub const fn new(start: u64) -> Self {
        Self { now: start }
    }

    /// Set the current time.
    pub fn set(&mut self, now_millis: u64) {
        self.now = now_millis;
    }

    /// Advance by `dt` millis.
    pub fn advance(&mut self, dt: u64) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}
