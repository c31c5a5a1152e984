//! Intercom door opener: a relay that buzzes the door and a voltage line
//! that goes high while the bell rings.
//!
//! Unlike the memory lock there is no persisted state and no timers; the
//! relay level *is* the lock state (High = released), and both lock
//! characteristics read straight from it.

use embedded_hal::digital::PinState;
use log::{error, info, warn};

use crate::app::events::AccessoryEvent;
use crate::app::ports::{AccessoryPort, Line, LinePort, NotifyPort};
use crate::config::IntercomConfig;
use crate::error::Result;
use crate::lock::{ContactState, LockStateCode, TargetState};

pub struct IntercomDoor<L, N, A> {
    config: IntercomConfig,
    lines: L,
    notifier: N,
    accessory: A,
}

impl<L, N, A> IntercomDoor<L, N, A>
where
    L: LinePort,
    N: NotifyPort,
    A: AccessoryPort,
{
    pub fn new(config: IntercomConfig, lines: L, notifier: N, accessory: A) -> Self {
        Self {
            config,
            lines,
            notifier,
            accessory,
        }
    }

    /// Arm the bell-line watch. Failure leaves the lock usable.
    pub fn start(&mut self) {
        if let Err(e) = self.lines.watch_line(Line::Sensor) {
            warn!("intercom[{}]: bell watch unavailable: {}", self.config.name, e);
        }
    }

    pub fn config(&self) -> &IntercomConfig {
        &self.config
    }

    /// Current lock state as read back from the relay line.
    pub fn get_lock_state(&mut self) -> Result<LockStateCode> {
        let level = self.lines.read_line(Line::Relay).map_err(|e| {
            error!("intercom[{}]: {}", self.config.name, e);
            e
        })?;
        let state = match level {
            PinState::High => LockStateCode::Unsecured,
            PinState::Low => LockStateCode::Secured,
        };
        info!("intercom[{}]: lock state is {:?}", self.config.name, state);
        Ok(state)
    }

    /// Drive the relay. Notifies only once the write succeeded.
    pub fn set_lock_state(&mut self, target: TargetState) -> Result<()> {
        let level = match target {
            TargetState::Unsecured => PinState::High,
            TargetState::Secured => PinState::Low,
        };
        self.lines.write_line(Line::Relay, level).map_err(|e| {
            error!("intercom[{}]: {}", self.config.name, e);
            e
        })?;

        let current = match target {
            TargetState::Unsecured => LockStateCode::Unsecured,
            TargetState::Secured => LockStateCode::Secured,
        };
        info!("intercom[{}]: lock state set to {:?}", self.config.name, current);
        self.accessory
            .publish(&AccessoryEvent::LockState { current, target });
        self.notify(match target {
            TargetState::Unsecured => "Door is open",
            TargetState::Secured => "Door is closed",
        });
        Ok(())
    }

    /// Raw voltage line level as a contact state.
    pub fn get_contact_state(&mut self) -> Result<ContactState> {
        let level = self.lines.read_line(Line::Sensor).map_err(|e| {
            error!("intercom[{}]: {}", self.config.name, e);
            e
        })?;
        let state = ContactState::from(level);
        info!("intercom[{}]: contact state is {:?}", self.config.name, state);
        Ok(state)
    }

    /// An edge arrived on the voltage line.
    pub fn on_bell_edge(&mut self) {
        let level = match self.lines.read_line(Line::Sensor) {
            Ok(level) => level,
            Err(e) => {
                error!("intercom[{}]: bell sample failed: {}", self.config.name, e);
                return;
            }
        };
        info!("intercom[{}]: voltage changed to {:?}", self.config.name, level);
        self.accessory.publish(&AccessoryEvent::Contact {
            state: ContactState::from(level),
        });
        if level == PinState::High {
            self.notify("Bell was pressed");
        }
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn accessory(&self) -> &A {
        &self.accessory
    }

    fn notify(&mut self, message: &str) {
        if let Err(e) = self.notifier.notify(message) {
            warn!("intercom[{}]: notification dropped: {}", self.config.name, e);
        }
    }
}
