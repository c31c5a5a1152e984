//! Application core: bridge surface and port boundary, zero I/O.
//!
//! Both accessory variants (memory lock, intercom) are driven through the
//! [`service::LockAccessory`] surface. All interaction with hardware,
//! storage and the network happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
