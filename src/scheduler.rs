//! Auto-relock scheduler.
//!
//! Forces the lock back towards "secure" a fixed window after the most
//! recent unlock. The window restarts on every unlock (last call wins),
//! so a burst of unlock requests yields a single firing measured from the
//! last one.
//!
//! ```text
//!  unlock ─▶ arm(now) ──────────── window ───────────▶ poll(now) == true
//!  unlock ─▶ arm(now') ─ replaces ─ window ─▶ ...         (reconciler
//!  manual secure ─▶ cancel()                               feeds RelockElapsed)
//! ```
//!
//! What the firing *does* is decided by the reconciler's transition
//! rules: a plain lock engages the relay, a memory lock shows the
//! transient "Secured" flash.

use log::info;

use crate::timer::OneShotTimer;

pub struct RelockScheduler {
    timer: OneShotTimer<()>,
    window_ms: u64,
}

impl RelockScheduler {
    pub fn new(window_ms: u64) -> Self {
        Self {
            timer: OneShotTimer::new("relock"),
            window_ms,
        }
    }

    /// (Re)start the relock window from `now_ms`.
    pub fn arm(&mut self, now_ms: u64) {
        if self.timer.arm(now_ms, self.window_ms, ()) {
            info!("Relock: window extended, fires in {}ms", self.window_ms);
        } else {
            info!("Relock: armed, fires in {}ms", self.window_ms);
        }
    }

    pub fn cancel(&mut self) {
        if self.timer.cancel().is_some() {
            info!("Relock: cancelled");
        }
    }

    /// Returns `true` once when the window has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        self.timer.poll(now_ms).is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.timer.deadline()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }
}
