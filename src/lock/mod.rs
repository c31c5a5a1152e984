//! Lock/door state reconciliation engine.
//!
//! ```text
//!  door edge ──▶ debounce ──▶ ┌───────────────────────┐ ──▶ relay write
//!  bridge set ──────────────▶ │  transition(state, in) │ ──▶ NVS record
//!  relock / flash timers ───▶ │   → (next, effects)    │ ──▶ publish / notify
//!                             └───────────────────────┘
//! ```
//!
//! [`transition`] is the pure rule set; [`reconciler::LockReconciler`]
//! owns the ports and timers and applies the resulting effects.

pub mod reconciler;
pub mod transition;

use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};

pub use transition::{transition, Effect, LockInput, RelayDrive, Transition};

/// Settle delay between a door edge and sampling the reed switch.
pub const DEBOUNCE_MS: u64 = 20;

/// How long a memory lock shows the transient "Secured" before reverting.
pub const FLASH_REVERT_MS: u64 = 500;

// ---------------------------------------------------------------------------
// State codes
// ---------------------------------------------------------------------------

/// LockCurrentState values as published to the bridge.
///
/// The discriminants are the persisted/wire integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LockStateCode {
    Unsecured = 0,
    Secured = 1,
    Jammed = 2,
    Unknown = 3,
}

impl LockStateCode {
    /// Decode a persisted byte. Anything out of range is `None`.
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Unsecured),
            1 => Some(Self::Secured),
            2 => Some(Self::Jammed),
            3 => Some(Self::Unknown),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// LockTargetState values. The bridge can only request these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TargetState {
    Unsecured = 0,
    Secured = 1,
}

impl TargetState {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Unsecured),
            1 => Some(Self::Secured),
            _ => None,
        }
    }

    /// Target implied by a restored current state. Jammed/Unknown fall
    /// back to Secured, the bridge's resting target.
    pub fn from_current(current: LockStateCode) -> Self {
        match current {
            LockStateCode::Unsecured => Self::Unsecured,
            _ => Self::Secured,
        }
    }
}

/// ContactSensorState values (intercom bell line, door reed switch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContactState {
    Detected = 0,
    NotDetected = 1,
}

impl From<PinState> for ContactState {
    fn from(level: PinState) -> Self {
        match level {
            PinState::Low => Self::Detected,
            PinState::High => Self::NotDetected,
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

/// The reconciled (current, target, lockState) triple for one lock.
///
/// `current`/`target` are what the bridge sees. `lock_state` is the
/// engine's belief about catch engagement, which ignores door position.
/// Timer handles live next to this value in the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeState {
    pub current: LockStateCode,
    pub target: TargetState,
    pub lock_state: LockStateCode,
    /// Last debounced door position, `None` until the first settle.
    pub door_open: Option<bool>,
    /// Pair a pending "Secured" flash will restore. While set, `current`
    /// and `target` hold the transient display, not the real state.
    pub flash_revert: Option<(LockStateCode, TargetState)>,
}

impl RuntimeState {
    /// Seed from the persisted record (absent ⇒ Unknown).
    pub fn restored(persisted: Option<LockStateCode>) -> Self {
        let current = persisted.unwrap_or(LockStateCode::Unknown);
        Self {
            current,
            target: TargetState::from_current(current),
            lock_state: current,
            door_open: None,
            flash_revert: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Polarity
// ---------------------------------------------------------------------------

/// Relay level that releases the magnet (the relay's active level).
pub fn release_level(active_low: bool) -> PinState {
    if active_low { PinState::Low } else { PinState::High }
}

/// Relay level that holds the magnet engaged.
pub fn engage_level(active_low: bool) -> PinState {
    !release_level(active_low)
}

/// Whether a sampled reed-switch level means the door is open.
///
/// The switch is active (magnet present) while the door is closed.
pub fn door_open_from_level(level: PinState, reed_switch_active_low: bool) -> bool {
    let active = match level {
        PinState::Low => reed_switch_active_low,
        PinState::High => !reed_switch_active_low,
    };
    !active
}
