//! Intercom / memory-lock door firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod intercom;
pub mod lock;
pub mod pins;
pub mod scheduler;
pub mod timer;

pub mod adapters;
pub mod drivers;

#[cfg(feature = "espidf")]
mod esp_link_shims;

// Host tests use the std critical-section impl behind embassy-sync channels.
#[cfg(all(test, not(feature = "espidf")))]
use critical_section as _;
