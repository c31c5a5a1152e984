//! Accessory configuration.
//!
//! Loaded once at boot from NVS (JSON) or the compiled-in defaults and
//! immutable afterwards. Keys follow the bridge's camelCase accessory
//! config; unknown keys are rejected rather than silently ignored.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;

/// Highest GPIO number on the ESP32-S3.
pub const MAX_GPIO: u8 = 48;

const MAX_NAME_LEN: usize = 64;
const MIN_UNLOCKING_SECS: f32 = 0.1;
const MAX_UNLOCKING_SECS: f32 = 3600.0;

pub const DEFAULT_LOCK_NAME: &str = "Door Lock";
pub const DEFAULT_INTERCOM_NAME: &str = "Intercom Door";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

fn default_true() -> bool {
    true
}

fn default_relay_pin() -> u8 {
    pins::RELAY_GPIO
}

fn default_voltage_pin() -> u8 {
    pins::VOLTAGE_GPIO
}

fn default_unlocking_duration() -> f32 {
    2.0
}

fn default_intercom_name() -> String {
    DEFAULT_INTERCOM_NAME.into()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

// ---------------------------------------------------------------------------
// Memory lock
// ---------------------------------------------------------------------------

/// Electromagnetic lock with optional door reed switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeviceConfig {
    /// Bridge registration tag. Carried through, not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory: Option<String>,
    /// Display name and persistence key.
    pub name: String,
    #[serde(alias = "lockPin", default = "default_relay_pin")]
    pub relay_pin: u8,
    #[serde(default)]
    pub door_pin: Option<u8>,
    /// Relay releases the magnet on a low level.
    #[serde(default = "default_true")]
    pub active_low: bool,
    /// Reed switch pulls low while the door is shut.
    #[serde(default = "default_true")]
    pub reed_switch_active_low: bool,
    /// Seconds from the last unlock until the auto-relock fires.
    #[serde(rename = "unlockingDuration", default = "default_unlocking_duration")]
    pub unlocking_duration_secs: f32,
    /// The lock cannot be commanded locked once released.
    #[serde(default = "default_true")]
    pub lock_with_memory: bool,
    /// Notification endpoint; `None` keeps notifications log-only.
    #[serde(rename = "apiURL", default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl DeviceConfig {
    /// A config with every optional field at its default.
    pub fn named(name: &str) -> Self {
        Self {
            accessory: None,
            name: name.into(),
            relay_pin: default_relay_pin(),
            door_pin: None,
            active_low: true,
            reed_switch_active_low: true,
            unlocking_duration_secs: default_unlocking_duration(),
            lock_with_memory: true,
            api_url: None,
        }
    }

    /// Parse and validate a JSON accessory block.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn unlocking_duration_ms(&self) -> u64 {
        (self.unlocking_duration_secs * 1000.0).round() as u64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.name)?;
        validate_pin(self.relay_pin, "relayPin must be a GPIO number 0–48")?;
        if let Some(door) = self.door_pin {
            validate_pin(door, "doorPin must be a GPIO number 0–48")?;
            if door == self.relay_pin {
                return Err(ConfigError::ValidationFailed(
                    "doorPin must differ from relayPin",
                ));
            }
        }
        let secs = self.unlocking_duration_secs;
        if !secs.is_finite() || !(MIN_UNLOCKING_SECS..=MAX_UNLOCKING_SECS).contains(&secs) {
            return Err(ConfigError::ValidationFailed(
                "unlockingDuration must be 0.1–3600 seconds",
            ));
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            door_pin: Some(pins::DOOR_GPIO),
            ..Self::named(DEFAULT_LOCK_NAME)
        }
    }
}

// ---------------------------------------------------------------------------
// Intercom
// ---------------------------------------------------------------------------

/// Relay + bell-voltage intercom door opener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IntercomConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory: Option<String>,
    #[serde(default = "default_intercom_name")]
    pub name: String,
    #[serde(default = "default_relay_pin")]
    pub relay_pin: u8,
    #[serde(default = "default_voltage_pin")]
    pub voltage_pin: u8,
    #[serde(rename = "apiURL", default = "default_api_url")]
    pub api_url: String,
}

impl IntercomConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.name)?;
        validate_pin(self.relay_pin, "relayPin must be a GPIO number 0–48")?;
        validate_pin(self.voltage_pin, "voltagePin must be a GPIO number 0–48")?;
        if self.voltage_pin == self.relay_pin {
            return Err(ConfigError::ValidationFailed(
                "voltagePin must differ from relayPin",
            ));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::ValidationFailed(
                "apiURL must be an http(s) URL",
            ));
        }
        Ok(())
    }
}

impl Default for IntercomConfig {
    fn default() -> Self {
        Self {
            accessory: None,
            name: default_intercom_name(),
            relay_pin: default_relay_pin(),
            voltage_pin: default_voltage_pin(),
            api_url: default_api_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// Site (what this board runs)
// ---------------------------------------------------------------------------

/// The accessories wired to this board. Persisted as one JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default)]
    pub lock: Option<DeviceConfig>,
    #[serde(default)]
    pub intercom: Option<IntercomConfig>,
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// The board's single notification endpoint. The intercom's `apiURL`
    /// wins over the lock's.
    pub fn notify_endpoint(&self) -> Option<&str> {
        self.intercom
            .as_ref()
            .map(|i| i.api_url.as_str())
            .or_else(|| self.lock.as_ref().and_then(|l| l.api_url.as_deref()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(lock) = &self.lock {
            lock.validate()?;
        }
        if let Some(intercom) = &self.intercom {
            intercom.validate()?;
        }
        if let (Some(lock), Some(intercom)) = (&self.lock, &self.intercom) {
            let lock_pins = [Some(lock.relay_pin), lock.door_pin];
            if lock_pins.contains(&Some(intercom.relay_pin))
                || lock_pins.contains(&Some(intercom.voltage_pin))
            {
                return Err(ConfigError::ValidationFailed(
                    "lock and intercom must not share GPIO pins",
                ));
            }
            if lock.name == intercom.name {
                return Err(ConfigError::ValidationFailed(
                    "accessory names must be unique",
                ));
            }
        }
        Ok(())
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            lock: Some(DeviceConfig::default()),
            intercom: None,
        }
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::ValidationFailed("name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ConfigError::ValidationFailed("name must be at most 64 bytes"));
    }
    Ok(())
}

fn validate_pin(pin: u8, msg: &'static str) -> Result<(), ConfigError> {
    if pin > MAX_GPIO {
        return Err(ConfigError::ValidationFailed(msg));
    }
    Ok(())
}
