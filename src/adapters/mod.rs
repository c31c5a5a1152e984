//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements      | Connects to                      |
//! |-------------|-----------------|----------------------------------|
//! | `gpio`      | LinePort        | embedded-hal relay + sensor pins |
//! | `log_sink`  | AccessoryPort   | Serial log output                |
//! | `notifier`  | NotifyPort      | HTTP `<apiURL>/notify`           |
//! | `nvs`       | LockStatePort   | NVS / in-memory store            |
//! |             | ConfigPort      |                                  |
//! |             | StoragePort     |                                  |
//! | `time`      | (clock)         | ESP32 system timer               |

pub mod gpio;
pub mod log_sink;
pub mod notifier;
pub mod nvs;
pub mod time;
