//! Outbound accessory events.
//!
//! Devices emit these through the
//! [`AccessoryPort`](super::ports::AccessoryPort). Adapters on the other
//! side decide what to do with them: log to serial, push to the bridge
//! response channel, or record them in tests.

use serde::Serialize;

use crate::lock::{ContactState, LockStateCode, TargetState};

/// Characteristic updates and diagnostics emitted by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AccessoryEvent {
    /// LockCurrentState / LockTargetState changed (or were re-announced).
    LockState {
        current: LockStateCode,
        target: TargetState,
    },

    /// ContactSensorState changed (intercom bell line).
    Contact { state: ContactState },

    /// The door table saw a lock state it has no row for.
    Anomaly { lock_state: LockStateCode },
}
