//! Inbound bridge requests and their responses.
//!
//! The bridge transport (HAP bridge, serial console) queues a
//! [`BridgeMsg`] on [`REQUEST_CHANNEL`] and raises
//! [`Event::BridgeRequest`](crate::events::Event::BridgeRequest). The
//! control loop answers each one on [`RESPONSE_CHANNEL`], so device state
//! is only ever touched from the loop.
//!
//! ```text
//! ┌──────────────┐  BridgeMsg    ┌──────────────┐
//! │  Transport   │─────────────▶│  Control Loop │
//! │              │◀─────────────│  (sync)       │
//! └──────────────┘  BridgeReply  └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::lock::{ContactState, LockStateCode, TargetState};

/// Which accessory on this board a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessoryId {
    Lock,
    Intercom,
}

/// Characteristic reads and writes the bridge can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BridgeRequest {
    GetCurrentState,
    GetTargetState,
    SetTargetState { target: TargetState },
    GetContactState,
}

/// Answer to one [`BridgeRequest`]. Every request gets exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeResponse {
    Current(LockStateCode),
    Target(TargetState),
    Contact(ContactState),
    /// A write completed.
    Done,
    /// The addressed accessory has no such characteristic.
    Unsupported,
    Failed(Error),
}

/// A request tagged with its destination and a transport correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeMsg {
    pub id: u32,
    pub accessory: AccessoryId,
    pub request: BridgeRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeReply {
    pub id: u32,
    pub response: BridgeResponse,
}

const REQUEST_DEPTH: usize = 8;
const RESPONSE_DEPTH: usize = 8;

/// Inbound requests: transport → control loop.
pub static REQUEST_CHANNEL: Channel<CriticalSectionRawMutex, BridgeMsg, REQUEST_DEPTH> =
    Channel::new();

/// Outbound replies: control loop → transport.
pub static RESPONSE_CHANNEL: Channel<CriticalSectionRawMutex, BridgeReply, RESPONSE_DEPTH> =
    Channel::new();
