//! Log-based accessory adapter.
//!
//! Implements [`AccessoryPort`] by writing characteristic updates to the
//! ESP-IDF logger (UART / USB-CDC in production). The bridge transport
//! reads the same values back through `LockAccessory` getters.

use log::{info, warn};

use crate::app::events::AccessoryEvent;
use crate::app::ports::AccessoryPort;

/// Adapter that logs every [`AccessoryEvent`] to the serial console.
pub struct LogAccessory {
    name: String,
}

impl LogAccessory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl AccessoryPort for LogAccessory {
    fn publish(&mut self, event: &AccessoryEvent) {
        match event {
            AccessoryEvent::LockState { current, target } => {
                info!("LOCK | {} | current={:?} target={:?}", self.name, current, target);
            }
            AccessoryEvent::Contact { state } => {
                info!("CONTACT | {} | {:?}", self.name, state);
            }
            AccessoryEvent::Anomaly { lock_state } => {
                warn!("ANOMALY | {} | unexpected lock state {:?}", self.name, lock_state);
            }
        }
    }
}
