//! Effectful shell around the pure transition rules.
//!
//! [`LockReconciler`] owns one lock's configuration, runtime state, ports
//! and timers. Every input (bridge command, door edge, timer expiry) is
//! turned into a [`LockInput`], run through [`transition`], and the
//! resulting effects are applied in order. The control loop is the only
//! caller, so no locking is needed.

use log::{error, info, warn};

use crate::app::events::AccessoryEvent;
use crate::app::ports::{AccessoryPort, Line, LinePort, LockStatePort, NotifyPort};
use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::scheduler::RelockScheduler;
use crate::timer::OneShotTimer;

use super::transition::door_reconciliation;
use super::{
    door_open_from_level, engage_level, release_level, transition, Effect, LockInput,
    LockStateCode, RelayDrive, RuntimeState, TargetState, Transition, DEBOUNCE_MS,
    FLASH_REVERT_MS,
};

/// Which timer came due during [`LockReconciler::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    Debounce,
    Flash,
    Relock,
}

pub struct LockReconciler<L, S, N, A> {
    config: DeviceConfig,
    state: RuntimeState,
    lines: L,
    store: S,
    notifier: N,
    accessory: A,
    debounce: OneShotTimer<()>,
    flash: OneShotTimer<(LockStateCode, TargetState)>,
    relock: RelockScheduler,
}

impl<L, S, N, A> LockReconciler<L, S, N, A>
where
    L: LinePort,
    S: LockStatePort,
    N: NotifyPort,
    A: AccessoryPort,
{
    /// Build a reconciler seeded from the persisted record for
    /// `config.name`. Nothing is published until [`start`](Self::start).
    pub fn new(config: DeviceConfig, lines: L, store: S, notifier: N, accessory: A) -> Self {
        let persisted = store.get_item(&config.name);
        let state = RuntimeState::restored(persisted);
        info!(
            "reconciler[{}]: restored {:?} (persisted={:?})",
            config.name, state.current, persisted
        );
        let relock = RelockScheduler::new(config.unlocking_duration_ms());
        Self {
            config,
            state,
            lines,
            store,
            notifier,
            accessory,
            debounce: OneShotTimer::new("debounce"),
            flash: OneShotTimer::new("flash"),
            relock,
        }
    }

    /// Publish the seeded state and arm the door watch.
    pub fn start(&mut self, now_ms: u64) {
        self.publish();

        if door_reconciliation(&self.config) {
            if let Err(e) = self.lines.watch_line(Line::Sensor) {
                warn!("reconciler[{}]: door watch unavailable: {}", self.config.name, e);
            }
        }

        // A plain lock that went down released would otherwise stay open.
        if !self.config.lock_with_memory && self.state.current == LockStateCode::Unsecured {
            self.relock.arm(now_ms);
        }
    }

    // ── Bridge surface ────────────────────────────────────────

    pub fn current_state(&self) -> LockStateCode {
        self.state.current
    }

    pub fn target_state(&self) -> TargetState {
        self.state.target
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Handle a LockTargetState write from the bridge.
    ///
    /// On a relay write failure nothing changes and the error is returned.
    pub fn set_target_state(&mut self, target: TargetState, now_ms: u64) -> Result<()> {
        info!("reconciler[{}]: target -> {:?}", self.config.name, target);
        let t = transition(&self.config, &self.state, LockInput::Command(target));
        self.apply(t, now_ms)
    }

    // ── Control loop surface ──────────────────────────────────

    /// A raw edge arrived on the door line.
    pub fn on_door_edge(&mut self, now_ms: u64) {
        let t = transition(&self.config, &self.state, LockInput::DoorEdge);
        if let Err(e) = self.apply(t, now_ms) {
            error!("reconciler[{}]: door edge: {}", self.config.name, e);
        }
    }

    /// Fire every timer due at `now_ms`, earliest deadline first.
    pub fn poll(&mut self, now_ms: u64) {
        while let Some(due) = self.next_due(now_ms) {
            let result = match due {
                Due::Debounce => {
                    self.debounce.poll(now_ms);
                    self.door_settled(now_ms)
                }
                Due::Flash => match self.flash.poll(now_ms) {
                    Some((current, target)) => {
                        let t = transition(
                            &self.config,
                            &self.state,
                            LockInput::FlashElapsed { current, target },
                        );
                        self.apply(t, now_ms)
                    }
                    None => Ok(()),
                },
                Due::Relock => {
                    self.relock.poll(now_ms);
                    info!("reconciler[{}]: relock window elapsed", self.config.name);
                    let t = transition(&self.config, &self.state, LockInput::RelockElapsed);
                    self.apply(t, now_ms)
                }
            };
            if let Err(e) = result {
                error!("reconciler[{}]: {:?} timer: {}", self.config.name, due, e);
            }
        }
    }

    /// Earliest pending timer deadline, for sizing the loop's wait.
    pub fn next_deadline(&self) -> Option<u64> {
        [
            self.debounce.deadline(),
            self.flash.deadline(),
            self.relock.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    // ── Port access (tests, wiring) ───────────────────────────

    pub fn lines(&self) -> &L {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn accessory(&self) -> &A {
        &self.accessory
    }

    pub fn accessory_mut(&mut self) -> &mut A {
        &mut self.accessory
    }

    // ── Internals ─────────────────────────────────────────────

    fn next_due(&self, now_ms: u64) -> Option<Due> {
        [
            (Due::Debounce, self.debounce.deadline()),
            (Due::Flash, self.flash.deadline()),
            (Due::Relock, self.relock.deadline()),
        ]
        .into_iter()
        .filter_map(|(due, deadline)| deadline.filter(|d| *d <= now_ms).map(|d| (d, due)))
        .min_by_key(|(d, _)| *d)
        .map(|(_, due)| due)
    }

    fn door_settled(&mut self, now_ms: u64) -> Result<()> {
        let level = match self.lines.read_line(Line::Sensor) {
            Ok(level) => level,
            Err(e) => {
                // Keep the last known position; the next edge retries.
                warn!("reconciler[{}]: door sample failed: {}", self.config.name, e);
                return Ok(());
            }
        };
        let open = door_open_from_level(level, self.config.reed_switch_active_low);
        info!(
            "reconciler[{}]: door {} (lock_state={:?})",
            self.config.name,
            if open { "open" } else { "closed" },
            self.state.lock_state
        );
        let t = transition(&self.config, &self.state, LockInput::DoorSettled { open });
        self.apply(t, now_ms)
    }

    /// Carry out `t`. A relay drive runs first; if it fails the state is
    /// left untouched and no other effect runs.
    fn apply(&mut self, t: Transition, now_ms: u64) -> Result<()> {
        let mut effects = t.effects.iter().peekable();
        if let Some(Effect::DriveRelay(drive)) = effects.peek() {
            self.drive_relay(*drive)?;
            effects.next();
        }

        self.state = t.next;

        for effect in effects {
            match *effect {
                Effect::DriveRelay(drive) => self.drive_relay(drive)?,
                Effect::Persist(code) => self.store.set_item(&self.config.name, code),
                Effect::Publish => self.publish(),
                Effect::Notify(message) => self.notify(message),
                Effect::ArmDebounce => {
                    self.debounce.arm(now_ms, DEBOUNCE_MS, ());
                }
                Effect::ArmRelock => self.relock.arm(now_ms),
                Effect::CancelRelock => self.relock.cancel(),
                Effect::ArmFlash { current, target } => {
                    self.flash.arm(now_ms, FLASH_REVERT_MS, (current, target));
                }
                Effect::CancelFlash => {
                    self.flash.cancel();
                }
                Effect::ReportAnomaly(code) => {
                    warn!(
                        "reconciler[{}]: {}; reporting Unknown",
                        self.config.name,
                        Error::StateAnomaly(code)
                    );
                    self.accessory.publish(&AccessoryEvent::Anomaly { lock_state: code });
                }
            }
        }
        Ok(())
    }

    fn drive_relay(&mut self, drive: RelayDrive) -> Result<()> {
        let level = match drive {
            RelayDrive::Release => release_level(self.config.active_low),
            RelayDrive::Engage => engage_level(self.config.active_low),
        };
        self.lines.write_line(Line::Relay, level).map_err(|e| {
            error!("reconciler[{}]: relay {:?} failed: {}", self.config.name, drive, e);
            Error::from(e)
        })
    }

    fn publish(&mut self) {
        self.accessory.publish(&AccessoryEvent::LockState {
            current: self.state.current,
            target: self.state.target,
        });
    }

    fn notify(&mut self, message: &str) {
        info!("reconciler[{}]: {}", self.config.name, message);
        if let Err(e) = self.notifier.notify(message) {
            warn!("reconciler[{}]: notification dropped: {}", self.config.name, e);
        }
    }
}
