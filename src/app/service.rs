//! Application service: the bridge-facing core.
//!
//! [`LockAccessory`] is the one surface both device variants expose.
//! [`DoorService`] owns whichever accessories this board runs and routes
//! control-loop events and bridge requests to them. All I/O flows through
//! the ports each device was constructed with, so the whole service is
//! testable with mock adapters.
//!
//! ```text
//!  Event queue ──▶ ┌──────────────────────────┐ ──▶ LinePort
//!                  │        DoorService        │ ──▶ LockStatePort
//! BridgeMsg ─────▶ │  LockReconciler · Intercom│ ──▶ NotifyPort
//!                  └──────────────────────────┘ ──▶ AccessoryPort
//! ```

use log::{info, warn};

use crate::error::Result;
use crate::events::Event;
use crate::intercom::IntercomDoor;
use crate::lock::reconciler::LockReconciler;
use crate::lock::{ContactState, LockStateCode, TargetState};

use super::commands::{AccessoryId, BridgeMsg, BridgeReply, BridgeRequest, BridgeResponse};
use super::ports::{AccessoryPort, LinePort, LockStatePort, NotifyPort};

// ───────────────────────────────────────────────────────────────
// LockAccessory
// ───────────────────────────────────────────────────────────────

/// What the bridge can ask of a lock-like accessory.
pub trait LockAccessory {
    fn name(&self) -> &str;

    /// Publish initial state and arm edge watches.
    fn start(&mut self, now_ms: u64);

    fn current_state(&mut self) -> Result<LockStateCode>;

    fn target_state(&mut self) -> Result<TargetState>;

    fn set_target_state(&mut self, target: TargetState, now_ms: u64) -> Result<()>;

    /// `None` when the accessory has no contact sensor service.
    fn contact_state(&mut self) -> Option<Result<ContactState>>;

    /// An edge arrived on the accessory's sensor line.
    fn on_sensor_edge(&mut self, now_ms: u64);

    /// Service due timers.
    fn poll(&mut self, _now_ms: u64) {}

    fn next_deadline(&self) -> Option<u64> {
        None
    }
}

impl<L, S, N, A> LockAccessory for LockReconciler<L, S, N, A>
where
    L: LinePort,
    S: LockStatePort,
    N: NotifyPort,
    A: AccessoryPort,
{
    fn name(&self) -> &str {
        &self.config().name
    }

    fn start(&mut self, now_ms: u64) {
        LockReconciler::start(self, now_ms);
    }

    fn current_state(&mut self) -> Result<LockStateCode> {
        Ok(LockReconciler::current_state(self))
    }

    fn target_state(&mut self) -> Result<TargetState> {
        Ok(LockReconciler::target_state(self))
    }

    fn set_target_state(&mut self, target: TargetState, now_ms: u64) -> Result<()> {
        LockReconciler::set_target_state(self, target, now_ms)
    }

    fn contact_state(&mut self) -> Option<Result<ContactState>> {
        None
    }

    fn on_sensor_edge(&mut self, now_ms: u64) {
        self.on_door_edge(now_ms);
    }

    fn poll(&mut self, now_ms: u64) {
        LockReconciler::poll(self, now_ms);
    }

    fn next_deadline(&self) -> Option<u64> {
        LockReconciler::next_deadline(self)
    }
}

impl<L, N, A> LockAccessory for IntercomDoor<L, N, A>
where
    L: LinePort,
    N: NotifyPort,
    A: AccessoryPort,
{
    fn name(&self) -> &str {
        &self.config().name
    }

    fn start(&mut self, _now_ms: u64) {
        IntercomDoor::start(self);
    }

    fn current_state(&mut self) -> Result<LockStateCode> {
        self.get_lock_state()
    }

    fn target_state(&mut self) -> Result<TargetState> {
        self.get_lock_state().map(TargetState::from_current)
    }

    fn set_target_state(&mut self, target: TargetState, _now_ms: u64) -> Result<()> {
        self.set_lock_state(target)
    }

    fn contact_state(&mut self) -> Option<Result<ContactState>> {
        Some(self.get_contact_state())
    }

    fn on_sensor_edge(&mut self, _now_ms: u64) {
        self.on_bell_edge();
    }
}

/// Answer one bridge request. Never fails: errors become
/// [`BridgeResponse::Failed`].
pub fn handle_request(
    device: &mut impl LockAccessory,
    request: BridgeRequest,
    now_ms: u64,
) -> BridgeResponse {
    let response = match request {
        BridgeRequest::GetCurrentState => device
            .current_state()
            .map_or_else(BridgeResponse::Failed, BridgeResponse::Current),
        BridgeRequest::GetTargetState => device
            .target_state()
            .map_or_else(BridgeResponse::Failed, BridgeResponse::Target),
        BridgeRequest::SetTargetState { target } => device
            .set_target_state(target, now_ms)
            .map_or_else(BridgeResponse::Failed, |()| BridgeResponse::Done),
        BridgeRequest::GetContactState => match device.contact_state() {
            Some(Ok(state)) => BridgeResponse::Contact(state),
            Some(Err(e)) => BridgeResponse::Failed(e),
            None => BridgeResponse::Unsupported,
        },
    };
    if let BridgeResponse::Failed(e) = response {
        warn!("bridge: {} {:?} failed: {}", device.name(), request, e);
    }
    response
}

// ───────────────────────────────────────────────────────────────
// DoorService
// ───────────────────────────────────────────────────────────────

/// The accessories wired to this board, driven by the control loop.
pub struct DoorService<LK, IC> {
    lock: Option<LK>,
    intercom: Option<IC>,
}

impl<LK: LockAccessory, IC: LockAccessory> DoorService<LK, IC> {
    pub fn new(lock: Option<LK>, intercom: Option<IC>) -> Self {
        Self { lock, intercom }
    }

    pub fn start(&mut self, now_ms: u64) {
        if let Some(lock) = self.lock.as_mut() {
            lock.start(now_ms);
            info!("service: lock '{}' started", lock.name());
        }
        if let Some(intercom) = self.intercom.as_mut() {
            intercom.start(now_ms);
            info!("service: intercom '{}' started", intercom.name());
        }
    }

    /// Route one control-loop event. Bridge requests are answered
    /// separately through [`handle_msg`](Self::handle_msg).
    pub fn handle_event(&mut self, event: Event, now_ms: u64) {
        match event {
            Event::DoorEdge => {
                if let Some(lock) = self.lock.as_mut() {
                    lock.on_sensor_edge(now_ms);
                }
            }
            Event::BellEdge => {
                if let Some(intercom) = self.intercom.as_mut() {
                    intercom.on_sensor_edge(now_ms);
                }
            }
            Event::BridgeRequest | Event::ControlTick => {}
        }
        self.poll(now_ms);
    }

    pub fn handle_msg(&mut self, msg: BridgeMsg, now_ms: u64) -> BridgeReply {
        let response = match msg.accessory {
            AccessoryId::Lock => self
                .lock
                .as_mut()
                .map(|d| handle_request(d, msg.request, now_ms)),
            AccessoryId::Intercom => self
                .intercom
                .as_mut()
                .map(|d| handle_request(d, msg.request, now_ms)),
        };
        BridgeReply {
            id: msg.id,
            response: response.unwrap_or_else(|| {
                warn!("service: no {:?} accessory on this board", msg.accessory);
                BridgeResponse::Unsupported
            }),
        }
    }

    pub fn poll(&mut self, now_ms: u64) {
        if let Some(lock) = self.lock.as_mut() {
            lock.poll(now_ms);
        }
        if let Some(intercom) = self.intercom.as_mut() {
            intercom.poll(now_ms);
        }
    }

    /// Earliest timer deadline across all accessories.
    pub fn next_deadline(&self) -> Option<u64> {
        let lock = self.lock.as_ref().and_then(LockAccessory::next_deadline);
        let intercom = self.intercom.as_ref().and_then(LockAccessory::next_deadline);
        lock.into_iter().chain(intercom).min()
    }

    pub fn lock(&self) -> Option<&LK> {
        self.lock.as_ref()
    }

    pub fn lock_mut(&mut self) -> Option<&mut LK> {
        self.lock.as_mut()
    }

    pub fn intercom(&self) -> Option<&IC> {
        self.intercom.as_ref()
    }

    pub fn intercom_mut(&mut self) -> Option<&mut IC> {
        self.intercom.as_mut()
    }
}
