//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LockReconciler / IntercomDoor (domain)
//! ```
//!
//! Driven adapters (GPIO lines, NVS, notification queue, bridge
//! characteristics) implement these traits. The device variants own
//! their ports, injected at construction, so the domain core never
//! touches hardware or globals directly.
//!
//! ## Polarity
//!
//! [`LinePort`] carries raw levels only. `activeLow` and
//! `reedSwitchActiveLow` are resolved inside the reconciler.

use embedded_hal::digital::PinState;

use crate::config::SiteConfig;
use crate::error::{IoError, NotifyError};
use crate::lock::LockStateCode;

use super::events::AccessoryEvent;

// ───────────────────────────────────────────────────────────────
// Line port (driven adapter: domain ↔ GPIO)
// ───────────────────────────────────────────────────────────────

/// Logical GPIO lines a device drives or samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    /// Relay output that releases the electromagnet.
    Relay,
    /// Input line: door reed switch on the lock, bell voltage on the intercom.
    Sensor,
}

/// Raw line access. Levels are electrical, not logical.
pub trait LinePort {
    /// Sample the current level of `line`.
    fn read_line(&mut self, line: Line) -> Result<PinState, IoError>;

    /// Drive `line` to `level`.
    fn write_line(&mut self, line: Line, level: PinState) -> Result<(), IoError>;

    /// Arm both-edge notifications for `line`. Edges arrive through the
    /// control loop's event queue, not through this call.
    fn watch_line(&mut self, line: Line) -> Result<(), IoError>;
}

// ───────────────────────────────────────────────────────────────
// Lock-state persistence port (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Last-known lock state per device name, durable across restarts.
///
/// Implementations never fail towards the caller: malformed or unreadable
/// records read back as `None`, write failures are logged and dropped.
/// Methods take `&self` so one store can back several devices.
pub trait LockStatePort {
    fn get_item(&self, name: &str) -> Option<LockStateCode>;

    fn set_item(&self, name: &str, state: LockStateCode);
}

impl<T: LockStatePort + ?Sized> LockStatePort for &T {
    fn get_item(&self, name: &str) -> Option<LockStateCode> {
        (**self).get_item(name)
    }

    fn set_item(&self, name: &str, state: LockStateCode) {
        (**self).set_item(name, state);
    }
}

impl<T: LockStatePort + ?Sized> LockStatePort for std::rc::Rc<T> {
    fn get_item(&self, name: &str) -> Option<LockStateCode> {
        (**self).get_item(name)
    }

    fn set_item(&self, name: &str, state: LockStateCode) {
        (**self).set_item(name, state);
    }
}

// ───────────────────────────────────────────────────────────────
// Notification port (driven adapter: domain → HTTP notifier)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget outbound messages ("Door is open", "Bell was pressed").
///
/// Callers log and drop any error; delivery never gates a lock operation.
pub trait NotifyPort {
    fn notify(&mut self, message: &str) -> Result<(), NotifyError>;
}

impl<T: NotifyPort + ?Sized> NotifyPort for Box<T> {
    fn notify(&mut self, message: &str) -> Result<(), NotifyError> {
        (**self).notify(message)
    }
}

// ───────────────────────────────────────────────────────────────
// Accessory port (driven adapter: domain → bridge characteristics)
// ───────────────────────────────────────────────────────────────

/// Receives characteristic updates for the bridge (LockCurrentState,
/// LockTargetState, ContactSensorState).
pub trait AccessoryPort {
    fn publish(&mut self, event: &AccessoryEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the site configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SiteConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SiteConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SiteConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced key-value blob storage.
///
/// Write operations MUST be atomic, with no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this natively.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
