//! Pure state-transition rules for the memory lock.
//!
//! `transition(config, state, input)` never touches hardware. It returns
//! the next [`RuntimeState`] plus an ordered list of [`Effect`]s that the
//! reconciler carries out. A relay drive, when present, is always the
//! first effect so a failed write can abort before anything else runs.
//!
//! ## Door table (memory lock with a door sensor)
//!
//! | door open | lockState | → lockState | → current | → target |
//! |-----------|-----------|-------------|-----------|----------|
//! | yes       | Unsecured | Secured     | Unsecured | Unsecured|
//! | yes       | Secured   | Secured     | Unsecured | Unsecured|
//! | no        | Secured   | Secured     | Secured   | Secured  |
//! | no        | Unsecured | Unsecured   | Unsecured | Unsecured|
//! | any       | other     | unchanged   | Unknown   | unchanged|

use heapless::Vec;
use log::warn;

use crate::config::DeviceConfig;

use super::{LockStateCode, RuntimeState, TargetState};

/// Upper bound on effects a single input can produce.
pub const MAX_EFFECTS: usize = 8;

/// Inputs to the reconciler, serialized through the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockInput {
    /// The bridge wrote LockTargetState.
    Command(TargetState),
    /// Raw edge on the door line (not yet debounced).
    DoorEdge,
    /// The debounce timer fired and the door line was sampled.
    DoorSettled { open: bool },
    /// The auto-relock window elapsed.
    RelockElapsed,
    /// The transient "Secured" display expired; restore this pair.
    FlashElapsed {
        current: LockStateCode,
        target: TargetState,
    },
}

/// Relay actuation requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayDrive {
    /// Drive the release (active) level.
    Release,
    /// Drive the engaged level. Never requested for memory locks.
    Engage,
}

/// Side effects, executed in order by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    DriveRelay(RelayDrive),
    /// Write this state to the persisted record.
    Persist(LockStateCode),
    /// Publish the next (current, target) pair to the bridge.
    Publish,
    Notify(&'static str),
    ArmDebounce,
    ArmRelock,
    CancelRelock,
    /// Arm the 500 ms revert carrying the pair to restore.
    ArmFlash {
        current: LockStateCode,
        target: TargetState,
    },
    CancelFlash,
    /// The door table fell through on this lock state.
    ReportAnomaly(LockStateCode),
}

/// Result of applying one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: RuntimeState,
    pub effects: Vec<Effect, MAX_EFFECTS>,
}

impl Transition {
    fn unchanged(state: &RuntimeState) -> Self {
        Self {
            next: *state,
            effects: Vec::new(),
        }
    }

    fn push(&mut self, effect: Effect) {
        if self.effects.push(effect).is_err() {
            warn!("transition: effect list full, dropping {:?}", effect);
        }
    }

    /// Whether this transition carries `effect`.
    pub fn has(&self, effect: &Effect) -> bool {
        self.effects.contains(effect)
    }
}

/// Whether door edges drive reconciliation for this configuration.
pub fn door_reconciliation(config: &DeviceConfig) -> bool {
    config.lock_with_memory && config.door_pin.is_some()
}

/// Apply `input` to `state` under `config`.
pub fn transition(config: &DeviceConfig, state: &RuntimeState, input: LockInput) -> Transition {
    match input {
        LockInput::Command(TargetState::Unsecured) => release(state),
        LockInput::Command(TargetState::Secured) => {
            if config.lock_with_memory {
                flash(state, revert_pair(state))
            } else {
                engage(state)
            }
        }
        LockInput::RelockElapsed => {
            if !config.lock_with_memory {
                engage(state)
            } else if door_reconciliation(config) {
                flash(state, revert_pair(state))
            } else {
                // No door corroboration: the catch has probably re-engaged,
                // but nothing confirms it.
                flash(state, (LockStateCode::Unknown, TargetState::Secured))
            }
        }
        LockInput::FlashElapsed { current, target } => {
            let mut t = Transition::unchanged(state);
            t.next.current = current;
            t.next.target = target;
            t.next.flash_revert = None;
            t.push(Effect::Publish);
            t
        }
        LockInput::DoorEdge => {
            let mut t = Transition::unchanged(state);
            if door_reconciliation(config) {
                t.push(Effect::ArmDebounce);
            }
            t
        }
        LockInput::DoorSettled { open } => {
            if door_reconciliation(config) {
                door_settled(state, open)
            } else {
                Transition::unchanged(state)
            }
        }
    }
}

fn release(state: &RuntimeState) -> Transition {
    let mut t = Transition::unchanged(state);
    t.push(Effect::DriveRelay(RelayDrive::Release));
    t.next.lock_state = LockStateCode::Unsecured;
    t.next.current = LockStateCode::Unsecured;
    t.next.target = TargetState::Unsecured;
    t.next.flash_revert = None;
    t.push(Effect::CancelFlash);
    t.push(Effect::Persist(LockStateCode::Unsecured));
    t.push(Effect::ArmRelock);
    t.push(Effect::Publish);
    t
}

fn engage(state: &RuntimeState) -> Transition {
    let mut t = Transition::unchanged(state);
    t.push(Effect::DriveRelay(RelayDrive::Engage));
    t.next.lock_state = LockStateCode::Secured;
    t.next.current = LockStateCode::Secured;
    t.next.target = TargetState::Secured;
    t.push(Effect::CancelRelock);
    t.push(Effect::Persist(LockStateCode::Secured));
    t.push(Effect::Publish);
    t
}

/// The real (current, target) pair. During a flash the visible pair is
/// the transient one, so the pending snapshot wins.
fn revert_pair(state: &RuntimeState) -> (LockStateCode, TargetState) {
    state.flash_revert.unwrap_or((state.current, state.target))
}

/// Memory lock "lock" request: show Secured briefly, then restore.
fn flash(state: &RuntimeState, revert: (LockStateCode, TargetState)) -> Transition {
    let (current, target) = revert;
    let mut t = Transition::unchanged(state);
    t.next.current = LockStateCode::Secured;
    t.next.target = TargetState::Secured;
    t.next.flash_revert = Some(revert);
    t.push(Effect::ArmFlash { current, target });
    t.push(Effect::Publish);
    t
}

fn door_settled(state: &RuntimeState, open: bool) -> Transition {
    let mut t = Transition::unchanged(state);
    t.next.flash_revert = None;
    t.push(Effect::CancelFlash);

    match (open, state.lock_state) {
        (true, LockStateCode::Unsecured) => {
            // The swinging door re-latches the released catch.
            t.next.lock_state = LockStateCode::Secured;
            t.next.current = LockStateCode::Unsecured;
            t.next.target = TargetState::Unsecured;
        }
        (true, LockStateCode::Secured) => {
            t.next.current = LockStateCode::Unsecured;
            t.next.target = TargetState::Unsecured;
        }
        (false, LockStateCode::Secured) => {
            t.next.current = LockStateCode::Secured;
            t.next.target = TargetState::Secured;
        }
        (false, LockStateCode::Unsecured) => {
            t.next.current = LockStateCode::Unsecured;
            t.next.target = TargetState::Unsecured;
        }
        (_, other) => {
            t.next.current = LockStateCode::Unknown;
            t.push(Effect::ReportAnomaly(other));
        }
    }

    t.next.door_open = Some(open);
    if state.door_open != Some(open) {
        t.push(Effect::Notify(if open { "Door is open" } else { "Door is closed" }));
    }
    t.push(Effect::Publish);
    t.push(Effect::Persist(t.next.current));
    t
}
