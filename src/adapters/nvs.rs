//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`], [`ConfigPort`] and [`LockStatePort`].
//!
//! - Site config is one JSON blob, validated before every save.
//! - Lock state is one byte per device. NVS keys are capped at 15 bytes,
//!   so the key is `ls` + the first 6 bytes (hex) of SHA-256 of the
//!   device name.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//!
//! The ESP-IDF NVS API serialises access internally, so every method
//! takes `&self` and one adapter can back several devices.

use crate::app::ports::{
    ConfigError, ConfigPort, LockStatePort, StorageError, StoragePort,
};
use crate::config::SiteConfig;
use crate::lock::LockStateCode;
use log::{info, warn};

#[cfg(not(feature = "espidf"))]
use std::collections::HashMap;

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "doorlock";
const CONFIG_KEY: &str = "sitecfg";
const LOCK_KEY_PREFIX: &str = "ls";

/// Largest config blob accepted on load.
const MAX_BLOB_SIZE: usize = 2048;

/// NVS key for a device's lock-state record.
pub fn lock_state_key(name: &str) -> heapless::String<15> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let digest = hmac_sha256::Hash::hash(name.as_bytes());
    let mut key = heapless::String::new();
    // 2 + 12 chars always fits the 15-byte capacity.
    let _ = key.push_str(LOCK_KEY_PREFIX);
    for byte in &digest[..6] {
        let _ = key.push(HEX[(byte >> 4) as usize] as char);
        let _ = key.push(HEX[(byte & 0x0F) as usize] as char);
    }
    key
}

/// Decode a persisted lock-state record. Anything but one valid byte is
/// treated as absent.
pub fn decode_lock_state(bytes: &[u8]) -> Option<LockStateCode> {
    match bytes {
        [raw] => LockStateCode::from_u8(*raw),
        _ => None,
    }
}

pub struct NvsAdapter {
    #[cfg(not(feature = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("nvs: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("nvs: ESP-IDF NVS initialised");
        }

        #[cfg(not(feature = "espidf"))]
        info!("nvs: simulation backend");

        Ok(Self {
            #[cfg(not(feature = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(feature = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of an NVS name (namespace or key, max 15 bytes).
    #[cfg(feature = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(feature = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

// ── ConfigPort ────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SiteConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match self.read(NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => {
                let json = core::str::from_utf8(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
                let cfg = SiteConfig::from_json(json)?;
                info!("nvs: loaded site config ({} bytes)", len);
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                info!("nvs: no stored config, using defaults");
                Ok(SiteConfig::default())
            }
            Err(e) => {
                warn!("nvs: config read failed ({}), using defaults", e);
                Ok(SiteConfig::default())
            }
        }
    }

    fn save(&self, config: &SiteConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_string(config).map_err(|_| ConfigError::IoError)?;
        if json.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::ValidationFailed("config exceeds NVS blob size"));
        }
        self.write(NAMESPACE, CONFIG_KEY, json.as_bytes()).map_err(|e| {
            warn!("nvs: config write failed: {}", e);
            ConfigError::IoError
        })?;
        info!("nvs: site config saved ({} bytes)", json.len());
        Ok(())
    }
}

// ── LockStatePort ─────────────────────────────────────────────

impl LockStatePort for NvsAdapter {
    fn get_item(&self, name: &str) -> Option<LockStateCode> {
        let key = lock_state_key(name);
        let mut buf = [0u8; 4];
        match self.read(NAMESPACE, &key, &mut buf) {
            Ok(len) => {
                let state = decode_lock_state(&buf[..len]);
                if state.is_none() {
                    warn!("nvs: malformed lock record for '{}' ({} bytes)", name, len);
                }
                state
            }
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("nvs: lock record for '{}' unreadable: {}", name, e);
                None
            }
        }
    }

    fn set_item(&self, name: &str, state: LockStateCode) {
        let key = lock_state_key(name);
        if let Err(e) = self.write(NAMESPACE, &key, &[state.as_u8()]) {
            warn!("nvs: failed to persist {:?} for '{}': {}", state, name, e);
        }
    }
}

// ── StoragePort ───────────────────────────────────────────────

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(feature = "espidf")]
        {
            let key_buf = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let key_buf = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let key_buf = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, key_buf.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(feature = "espidf")]
        {
            let key_buf = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let ret = unsafe {
                    nvs_find_key(handle, key_buf.as_ptr() as *const _, core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }
}
