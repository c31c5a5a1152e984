//! Unified error types for the door firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! bridge-facing handlers can always hand back one uniform result.
//! All variants are `Copy` so they can ride through the bridge response
//! channel without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, Line, StorageError};
use crate::lock::LockStateCode;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A relay or sensor line could not be read, written or watched.
    HardwareIo(IoError),
    /// The persisted state store failed. Swallowed by the reconciler.
    Persistence(StorageError),
    /// Best-effort notification delivery failed. Logged only.
    Notification(NotifyError),
    /// The door-edge table hit an unrecognised internal lock state.
    StateAnomaly(LockStateCode),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareIo(e) => write!(f, "hardware I/O: {e}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Notification(e) => write!(f, "notification: {e}"),
            Self::StateAnomaly(s) => write!(f, "state anomaly: lock state {s:?}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Hardware line errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// Sampling the line level failed.
    Read(Line),
    /// Driving the line level failed.
    Write(Line),
    /// Edge interrupt could not be armed on the line.
    Watch(Line),
}

impl IoError {
    /// The logical line the failure happened on.
    pub fn line(self) -> Line {
        match self {
            Self::Read(l) | Self::Write(l) | Self::Watch(l) => l,
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(l) => write!(f, "{l:?} line read failed"),
            Self::Write(l) => write!(f, "{l:?} line write failed"),
            Self::Watch(l) => write!(f, "{l:?} line watch failed"),
        }
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Self::HardwareIo(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Persistence(e)
    }
}

/// An unreadable config blob is a config problem; a failing backend is a
/// storage one.
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Persistence(StorageError::IoError),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyError {
    /// Outbound queue is full; the message was dropped.
    QueueFull,
    /// Token bucket empty; the message was dropped.
    RateLimited,
    /// Message does not fit the fixed-size queue slot.
    MessageTooLong,
    /// The HTTP transport reported a failure (status or ESP-IDF rc).
    Transport(i32),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "queue full"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::MessageTooLong => write!(f, "message too long"),
            Self::Transport(rc) => write!(f, "transport failed (rc={rc})"),
        }
    }
}

impl From<NotifyError> for Error {
    fn from(e: NotifyError) -> Self {
        Self::Notification(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
