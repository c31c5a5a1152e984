//! Mock adapters for integration tests.
//!
//! Every port call is recorded so tests can assert on the full history
//! (relay writes, persisted records, notifications, bridge events)
//! without touching real GPIO or NVS.

use std::cell::RefCell;
use std::collections::HashMap;

use embedded_hal::digital::PinState;
use intercom_door::app::events::AccessoryEvent;
use intercom_door::app::ports::{AccessoryPort, Line, LinePort, LockStatePort, NotifyPort};
use intercom_door::error::{IoError, NotifyError};
use intercom_door::lock::LockStateCode;

// ── Lines ─────────────────────────────────────────────────────

/// Scripted relay and sensor lines.
pub struct MockLines {
    pub relay: PinState,
    pub sensor: PinState,
    /// Every successful relay write, in order.
    pub relay_writes: Vec<PinState>,
    pub watched: Vec<Line>,
    pub fail_relay_write: bool,
    pub fail_relay_read: bool,
    pub fail_sensor_read: bool,
    pub fail_watch: bool,
}

#[allow(dead_code)]
impl MockLines {
    pub fn new() -> Self {
        Self {
            relay: PinState::Low,
            sensor: PinState::Low,
            relay_writes: Vec::new(),
            watched: Vec::new(),
            fail_relay_write: false,
            fail_relay_read: false,
            fail_sensor_read: false,
            fail_watch: false,
        }
    }

    /// Sensor line starting at `level`.
    pub fn with_sensor(level: PinState) -> Self {
        Self {
            sensor: level,
            ..Self::new()
        }
    }
}

impl Default for MockLines {
    fn default() -> Self {
        Self::new()
    }
}

impl LinePort for MockLines {
    fn read_line(&mut self, line: Line) -> Result<PinState, IoError> {
        match line {
            Line::Relay if self.fail_relay_read => Err(IoError::Read(line)),
            Line::Relay => Ok(self.relay),
            Line::Sensor if self.fail_sensor_read => Err(IoError::Read(line)),
            Line::Sensor => Ok(self.sensor),
        }
    }

    fn write_line(&mut self, line: Line, level: PinState) -> Result<(), IoError> {
        match line {
            Line::Relay if self.fail_relay_write => Err(IoError::Write(line)),
            Line::Relay => {
                self.relay = level;
                self.relay_writes.push(level);
                Ok(())
            }
            Line::Sensor => Err(IoError::Write(line)),
        }
    }

    fn watch_line(&mut self, line: Line) -> Result<(), IoError> {
        if self.fail_watch {
            return Err(IoError::Watch(line));
        }
        self.watched.push(line);
        Ok(())
    }
}

// ── Lock-state store ──────────────────────────────────────────

/// In-memory persisted lock states, keyed by device name.
#[derive(Default)]
pub struct MockStore {
    pub records: RefCell<HashMap<String, LockStateCode>>,
    pub writes: RefCell<Vec<(String, LockStateCode)>>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(name: &str, state: LockStateCode) -> Self {
        let store = Self::new();
        store.records.borrow_mut().insert(name.into(), state);
        store
    }

    pub fn record(&self, name: &str) -> Option<LockStateCode> {
        self.records.borrow().get(name).copied()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }
}

impl LockStatePort for MockStore {
    fn get_item(&self, name: &str) -> Option<LockStateCode> {
        self.record(name)
    }

    fn set_item(&self, name: &str, state: LockStateCode) {
        self.records.borrow_mut().insert(name.into(), state);
        self.writes.borrow_mut().push((name.into(), state));
    }
}

// ── Notifier ──────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Vec<String>,
    /// Reject every message with this error (still recorded as attempted).
    pub fail_with: Option<NotifyError>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: NotifyError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }
}

impl NotifyPort for RecordingNotifier {
    fn notify(&mut self, message: &str) -> Result<(), NotifyError> {
        self.messages.push(message.into());
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ── Accessory sink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingAccessory {
    pub events: Vec<AccessoryEvent>,
}

#[allow(dead_code)]
impl RecordingAccessory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&AccessoryEvent> {
        self.events.last()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl AccessoryPort for RecordingAccessory {
    fn publish(&mut self, event: &AccessoryEvent) {
        self.events.push(*event);
    }
}
