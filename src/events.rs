//! Interrupt-driven event system.
//!
//! Events are produced by:
//! - GPIO ISRs (door reed switch edges, bell voltage edges)
//! - The bridge transport (a request was queued on the request channel)
//! - The periodic control tick timer
//!
//! Events are consumed by the main control loop, which processes them
//! one at a time in FIFO order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Door ISR    │────▶│              │     │              │
//! │ Bell ISR    │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Bridge task │────▶│  (lock-free) │     │  (consumer)  │
//! │ Tick timer  │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending events.
/// Power of 2 for efficient ring buffer modulo.
const EVENT_QUEUE_CAP: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Either edge on the lock's door reed switch.
    DoorEdge = 0,
    /// Either edge on the intercom's bell voltage line.
    BellEdge = 1,
    /// A bridge request is waiting on the request channel.
    BridgeRequest = 10,
    /// Periodic wake to service lock timers.
    ControlTick = 20,
}

// ── Lock-free MPSC ring buffer ────────────────────────────────
//
// Producers (ISRs on either core, the bridge task, the loop itself)
// reserve a slot by advancing HEAD with a CAS, then publish into it.
// Slots hold `event + 1`; zero means "reserved but not yet written",
// and the single consumer stops there until the next drain.

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
static EVENT_SLOTS: [AtomicU8; EVENT_QUEUE_CAP] = [const { AtomicU8::new(0) }; EVENT_QUEUE_CAP];

const fn next_index(i: u8) -> u8 {
    (i + 1) % EVENT_QUEUE_CAP as u8
}

/// Push an event into the queue.
/// Safe to call from ISR context (lock-free).
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let mut head = EVENT_HEAD.load(Ordering::Relaxed);
    loop {
        if next_index(head) == EVENT_TAIL.load(Ordering::Acquire) {
            return false;
        }
        match EVENT_HEAD.compare_exchange_weak(
            head,
            next_index(head),
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(current) => head = current,
        }
    }
    EVENT_SLOTS[head as usize].store(event as u8 + 1, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Called from the main loop (single consumer).
pub fn pop_event() -> Option<Event> {
    loop {
        let tail = EVENT_TAIL.load(Ordering::Relaxed);
        if tail == EVENT_HEAD.load(Ordering::Acquire) {
            return None;
        }
        let raw = EVENT_SLOTS[tail as usize].swap(0, Ordering::Acquire);
        if raw == 0 {
            // Reserved, still being written.
            return None;
        }
        EVENT_TAIL.store(next_index(tail), Ordering::Release);
        if let Some(event) = event_from_u8(raw - 1) {
            return Some(event);
        }
    }
}

/// Drain all pending events into a callback, in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

pub fn queue_is_empty() -> bool {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);
    tail == head
}

/// Number of pending events.
pub fn queue_len() -> usize {
    let head = EVENT_HEAD.load(Ordering::Relaxed) as usize;
    let tail = EVENT_TAIL.load(Ordering::Relaxed) as usize;
    (head + EVENT_QUEUE_CAP - tail) % EVENT_QUEUE_CAP
}

fn event_from_u8(raw: u8) -> Option<Event> {
    match raw {
        0 => Some(Event::DoorEdge),
        1 => Some(Event::BellEdge),
        10 => Some(Event::BridgeRequest),
        20 => Some(Event::ControlTick),
        _ => None,
    }
}
