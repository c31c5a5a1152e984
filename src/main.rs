//! Intercom Door Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HalLines        NvsAdapter          QueuedNotifier  LogAccessory│
//! │  (LinePort)      (LockState+Config)  (NotifyPort)    (Accessory)│
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              DoorService (pure logic)                  │    │
//! │  │  LockReconciler · IntercomDoor · timers                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ISR event queue · bridge channels · notification thread       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use embedded_hal::digital::PinState;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use log::{error, info, warn};

use intercom_door::adapters::gpio::HalLines;
use intercom_door::adapters::log_sink::LogAccessory;
use intercom_door::adapters::notifier::{
    run_delivery, EspHttpPoster, LogNotifier, QueuedNotifier, NOTIFY_CHANNEL,
};
use intercom_door::adapters::nvs::NvsAdapter;
use intercom_door::adapters::time::MonotonicClock;
use intercom_door::app::commands::{REQUEST_CHANNEL, RESPONSE_CHANNEL};
use intercom_door::app::ports::{ConfigPort, NotifyPort};
use intercom_door::app::service::DoorService;
use intercom_door::config::{DeviceConfig, IntercomConfig, SiteConfig};
use intercom_door::drivers::hw_init;
use intercom_door::error::Error;
use intercom_door::events::{self, push_event, Event};
use intercom_door::intercom::IntercomDoor;
use intercom_door::lock::engage_level;
use intercom_door::lock::reconciler::LockReconciler;

/// Upper bound on how long the loop sleeps between event checks.
const TICK_MS: u64 = 10;

type Relay = PinDriver<'static, AnyOutputPin, Output>;
type Sensor = PinDriver<'static, AnyIOPin, Input>;
type WatchHook = Box<dyn FnMut() -> Result<(), i32>>;
type Lines = HalLines<Relay, Sensor, WatchHook>;
type Notifier = Box<dyn NotifyPort>;

type Lock = LockReconciler<Lines, Rc<NvsAdapter>, Notifier, LogAccessory>;
type Intercom = IntercomDoor<Lines, Notifier, LogAccessory>;

// ── Wiring ────────────────────────────────────────────────────

fn relay_pin(gpio: u8, rest: PinState) -> Result<Relay> {
    // SAFETY: each GPIO number is claimed once; config validation rejects
    // shared pins.
    let mut pin = PinDriver::output(unsafe { AnyOutputPin::new(i32::from(gpio)) })?;
    match rest {
        PinState::High => pin.set_high()?,
        PinState::Low => pin.set_low()?,
    }
    Ok(pin)
}

fn sensor_pin(gpio: u8) -> Result<Sensor> {
    // SAFETY: see `relay_pin`.
    let mut pin = PinDriver::input(unsafe { AnyIOPin::new(i32::from(gpio)) })?;
    pin.set_pull(Pull::Up)?;
    Ok(pin)
}

fn watch_hook(gpio: u8, event: Event) -> WatchHook {
    Box::new(move || hw_init::arm_edge_isr(gpio, event))
}

fn notifier(endpoint: Option<&str>) -> Notifier {
    match endpoint {
        Some(_) => Box::new(QueuedNotifier::new(&NOTIFY_CHANNEL)),
        None => Box::new(LogNotifier),
    }
}

fn build_lock(cfg: DeviceConfig, nvs: Rc<NvsAdapter>, endpoint: Option<&str>) -> Result<Lock> {
    let relay = relay_pin(cfg.relay_pin, engage_level(cfg.active_low))?;
    let sensor = cfg.door_pin.map(sensor_pin).transpose()?;
    let watch = watch_hook(cfg.door_pin.unwrap_or_default(), Event::DoorEdge);
    let lines = HalLines::new(relay, sensor, watch);
    let accessory = LogAccessory::new(cfg.name.clone());
    Ok(LockReconciler::new(cfg, lines, nvs, notifier(endpoint), accessory))
}

fn build_intercom(cfg: IntercomConfig, endpoint: Option<&str>) -> Result<Intercom> {
    let relay = relay_pin(cfg.relay_pin, PinState::Low)?;
    let sensor = sensor_pin(cfg.voltage_pin)?;
    let watch = watch_hook(cfg.voltage_pin, Event::BellEdge);
    let lines = HalLines::new(relay, Some(sensor), watch);
    let accessory = LogAccessory::new(cfg.name.clone());
    Ok(IntercomDoor::new(cfg, lines, notifier(endpoint), accessory))
}

fn load_site(nvs: &NvsAdapter) -> SiteConfig {
    match nvs.load() {
        Ok(site) => site,
        Err(e) => {
            warn!("{}; using defaults", Error::from(e));
            SiteConfig::default()
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Intercom Door v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    if let Err(e) = hw_init::init_isr_service() {
        error!("{}; continuing without door/bell edges", e);
    }

    // ── 2. Persistence + config ───────────────────────────────
    let nvs = Rc::new(
        NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {}", Error::from(e)))?,
    );
    let site = load_site(&nvs);
    let endpoint = site.notify_endpoint().map(str::to_owned);
    if let (Some(lock), Some(url)) = (&site.lock, &endpoint) {
        if lock.api_url.as_deref().is_some_and(|own| own != url) {
            warn!("Lock apiURL ignored; notifications go to {}", url);
        }
    }

    // ── 3. Notification delivery thread ───────────────────────
    if let Some(url) = endpoint.clone() {
        std::thread::Builder::new()
            .name("notify".into())
            .stack_size(8 * 1024)
            .spawn(move || {
                run_delivery(&NOTIFY_CHANNEL, EspHttpPoster { timeout_ms: 5_000 }, &url);
            })
            .context("spawning notification thread")?;
    }

    // ── 4. Accessories ────────────────────────────────────────
    let lock = site
        .lock
        .clone()
        .map(|cfg| build_lock(cfg, Rc::clone(&nvs), endpoint.as_deref()))
        .transpose()?;
    let intercom = site
        .intercom
        .clone()
        .map(|cfg| build_intercom(cfg, endpoint.as_deref()))
        .transpose()?;
    if lock.is_none() && intercom.is_none() {
        warn!("No accessories configured; idling");
    }

    let clock = MonotonicClock::new();
    let mut service: DoorService<Lock, Intercom> = DoorService::new(lock, intercom);
    service.start(clock.uptime_ms());

    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        events::drain_events(|event| {
            let now = clock.uptime_ms();
            match event {
                Event::BridgeRequest => {
                    while let Ok(msg) = REQUEST_CHANNEL.try_receive() {
                        let reply = service.handle_msg(msg, now);
                        if RESPONSE_CHANNEL.try_send(reply).is_err() {
                            warn!("Bridge: response queue full, reply {} dropped", reply.id);
                        }
                    }
                }
                other => service.handle_event(other, now),
            }
        });

        let now = clock.uptime_ms();
        let wait = service
            .next_deadline()
            .map_or(TICK_MS, |deadline| deadline.saturating_sub(now).min(TICK_MS));
        std::thread::sleep(Duration::from_millis(wait.max(1)));
        push_event(Event::ControlTick);
    }
}
