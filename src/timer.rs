//! Owned, cancellable one-shot timers driven by the control loop clock.
//!
//! There are no callbacks and no background threads: the owner calls
//! [`OneShotTimer::poll`] with the current monotonic time and gets the
//! payload back exactly once when the deadline has passed. Arming an
//! already-armed timer replaces it (cancel-then-start), so at most one
//! instance of each timer kind can ever fire.

use log::debug;

#[derive(Debug, Clone)]
pub struct OneShotTimer<T> {
    label: &'static str,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    deadline_ms: u64,
    payload: T,
}

impl<T> OneShotTimer<T> {
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            pending: None,
        }
    }

    /// Start the timer `delay_ms` from `now_ms`, dropping any pending
    /// instance. Returns `true` if a pending instance was replaced.
    pub fn arm(&mut self, now_ms: u64, delay_ms: u64, payload: T) -> bool {
        let replaced = self.pending.take().is_some();
        let deadline_ms = now_ms.saturating_add(delay_ms);
        debug!(
            "timer[{}]: armed for t={}ms{}",
            self.label,
            deadline_ms,
            if replaced { " (replaced pending)" } else { "" }
        );
        self.pending = Some(Pending {
            deadline_ms,
            payload,
        });
        replaced
    }

    /// Cancel the pending instance, returning its payload.
    pub fn cancel(&mut self) -> Option<T> {
        let p = self.pending.take()?;
        debug!("timer[{}]: cancelled", self.label);
        Some(p.payload)
    }

    /// Fire if due. Yields the payload once and disarms.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        match &self.pending {
            Some(p) if now_ms >= p.deadline_ms => self.pending.take().map(|p| p.payload),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.deadline_ms)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}
