//! Time source and the deadline timers the game controller owns.
//!
//! Timers never call back on their own. The controller asks them whether they
//! are due for a given `now` and fires them itself, which keeps every timer
//! cancellable by simply dropping it and lets tests drive time by hand.

use std::cell::Cell;

/// Millisecond time source. Browser builds use `performance.now()`; tests use
/// [`ManualClock`].
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// `performance.now()` in the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        performance_now()
    }
}

/// Clock advanced explicitly; used for deterministic simulation.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self { now: Cell::new(start_ms) }
    }

    pub fn advance(&self, ms: f64) -> f64 {
        let t = self.now.get() + ms;
        self.now.set(t);
        t
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn performance_now() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Repeating timer. Firing times are derived from the start time, not from
/// when the previous firing was observed, so late frames do not drift the
/// countdown.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    period_ms: f64,
    next_due_ms: f64,
    /// Round the timer was armed in.
    pub round: u32,
}

impl Interval {
    pub fn start(now_ms: f64, period_ms: f64, round: u32) -> Self {
        Self { period_ms, next_due_ms: now_ms + period_ms, round }
    }

    pub fn next_due_ms(&self) -> f64 {
        self.next_due_ms
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        self.next_due_ms <= now_ms
    }

    /// Consume the pending firing and return its scheduled time.
    pub fn fire(&mut self) -> f64 {
        let at = self.next_due_ms;
        self.next_due_ms += self.period_ms;
        at
    }
}

/// One-shot timer.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeout {
    due_ms: f64,
    pub round: u32,
}

impl Timeout {
    pub fn after(now_ms: f64, delay_ms: f64, round: u32) -> Self {
        Self { due_ms: now_ms + delay_ms, round }
    }

    pub fn due_ms(&self) -> f64 {
        self.due_ms
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        self.due_ms <= now_ms
    }
}
