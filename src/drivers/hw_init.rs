//! GPIO ISR service and per-pin edge interrupts.
//!
//! Pin directions and pulls are set up through esp-idf-hal `PinDriver`s
//! in `main()`. This module installs the shared GPIO ISR service and
//! attaches any-edge handlers that only push to the lock-free event queue.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(feature = "espidf")]
use log::info;

use crate::events::Event;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

// ── ISR service ───────────────────────────────────────────────

/// Install the per-pin GPIO ISR service. Call once before any
/// [`arm_edge_isr`].
#[cfg(feature = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means it was already installed.
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
        return Err(HwInitError::IsrInstallFailed(ret));
    }
    info!("hw_init: GPIO ISR service installed");
    Ok(())
}

#[cfg(not(feature = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

/// The handler argument carries the event discriminant, not a pointer.
#[cfg(feature = "espidf")]
unsafe extern "C" fn edge_isr(arg: *mut core::ffi::c_void) {
    let event = if arg as usize == Event::BellEdge as usize {
        Event::BellEdge
    } else {
        Event::DoorEdge
    };
    crate::events::push_event(event);
}

/// Enable any-edge interrupts on `pin`, raising `event` on each edge.
/// Returns the ESP-IDF error code on failure.
#[cfg(feature = "espidf")]
pub fn arm_edge_isr(pin: u8, event: Event) -> Result<(), i32> {
    let pin = i32::from(pin);
    // SAFETY: the handler is a static fn that only touches the lock-free
    // event queue; `arg` is never dereferenced.
    unsafe {
        let ret = gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_ANYEDGE);
        if ret != ESP_OK {
            return Err(ret);
        }
        let ret = gpio_isr_handler_add(pin, Some(edge_isr), event as usize as *mut core::ffi::c_void);
        if ret != ESP_OK {
            return Err(ret);
        }
        let ret = gpio_intr_enable(pin);
        if ret != ESP_OK {
            return Err(ret);
        }
    }
    info!("hw_init: GPIO{} any-edge -> {:?}", pin, event);
    Ok(())
}

#[cfg(not(feature = "espidf"))]
pub fn arm_edge_isr(pin: u8, event: Event) -> Result<(), i32> {
    log::info!("hw_init(sim): GPIO{} any-edge -> {:?}", pin, event);
    Ok(())
}
