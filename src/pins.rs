//! GPIO pin assignments for the door controller board.
//!
//! Single source of truth for the compiled-in defaults. Accessory config
//! can move any of these; the numbers here are what an unconfigured board
//! uses.

// ---------------------------------------------------------------------------
// Relay (electromagnet / door buzzer)
// ---------------------------------------------------------------------------

/// Digital output driving the lock relay module.
/// Active level is configurable (`activeLow`, default true).
pub const RELAY_GPIO: u8 = 7;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Door reed switch, both-edge interrupt.
/// LOW = door closed (magnet present) with the default `reedSwitchActiveLow`.
pub const DOOR_GPIO: u8 = 4;

/// Intercom bell line via optocoupler. HIGH while the bell rings.
pub const VOLTAGE_GPIO: u8 = 17;
