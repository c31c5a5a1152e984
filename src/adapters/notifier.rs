//! Outbound notification adapter.
//!
//! [`QueuedNotifier`] implements [`NotifyPort`] without ever blocking the
//! control loop: messages are rate limited, copied into a fixed-size slot
//! and `try_send`'d on a bounded `embassy-sync` channel. A delivery thread
//! drains the channel and POSTs each message to `<apiURL>/notify`.
//!
//! ```text
//!  reconciler / intercom ──▶ QueuedNotifier ──▶ NOTIFY_CHANNEL ──▶ delivery thread ──▶ HttpPost
//!                             (token bucket)     (depth 8)          (block_on)
//! ```
//!
//! Delivery is at-most-once: a full queue, an empty bucket or a failed
//! POST drops the message after logging it.

use core::time::Duration;

use burster::Limiter;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};
use serde::Serialize;

use crate::app::ports::NotifyPort;
use crate::error::NotifyError;

/// Longest message a queue slot holds.
pub const MAX_MESSAGE_LEN: usize = 64;

const QUEUE_DEPTH: usize = 8;

/// Messages allowed back to back before the 1/s refill applies.
pub const BURST: usize = 5;

pub type Message = heapless::String<MAX_MESSAGE_LEN>;
pub type NotifyChannel = Channel<CriticalSectionRawMutex, Message, QUEUE_DEPTH>;

/// Control loop → delivery thread.
pub static NOTIFY_CHANNEL: NotifyChannel = Channel::new();

// ── Producer side ─────────────────────────────────────────────

pub struct QueuedNotifier<'a> {
    channel: &'a NotifyChannel,
    limiter: burster::TokenBucket<fn() -> Duration>,
}

impl<'a> QueuedNotifier<'a> {
    pub fn new(channel: &'a NotifyChannel) -> Self {
        Self::with_clock(channel, platform_now)
    }

    /// Use `now` as the rate limiter's clock.
    pub fn with_clock(channel: &'a NotifyChannel, now: fn() -> Duration) -> Self {
        Self {
            channel,
            // 1 token per second, BURST capacity
            limiter: burster::TokenBucket::new_with_time_provider(1, BURST as _, now),
        }
    }
}

impl NotifyPort for QueuedNotifier<'_> {
    fn notify(&mut self, message: &str) -> Result<(), NotifyError> {
        let mut slot = Message::new();
        slot.push_str(message)
            .map_err(|_| NotifyError::MessageTooLong)?;
        if self.limiter.try_consume(1).is_err() {
            return Err(NotifyError::RateLimited);
        }
        self.channel
            .try_send(slot)
            .map_err(|_| NotifyError::QueueFull)
    }
}

/// Notifier for accessories without an endpoint: log only.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotifyPort for LogNotifier {
    fn notify(&mut self, message: &str) -> Result<(), NotifyError> {
        info!("notify: {} (no endpoint configured)", message);
        Ok(())
    }
}

// ── Delivery side ─────────────────────────────────────────────

/// One HTTP POST with a JSON body. Returns the response status.
pub trait HttpPost {
    fn post_json(&mut self, url: &str, body: &str) -> Result<u16, NotifyError>;
}

#[derive(Serialize)]
struct NotifyBody<'a> {
    message: &'a str,
}

/// POST one message to `<api_url>/notify`.
pub fn deliver(poster: &mut impl HttpPost, api_url: &str, message: &str) -> Result<(), NotifyError> {
    let url = format!("{}/notify", api_url.trim_end_matches('/'));
    let body = serde_json::to_string(&NotifyBody { message }).map_err(|_| NotifyError::Transport(-1))?;
    let status = poster.post_json(&url, &body)?;
    if !(200..300).contains(&status) {
        return Err(NotifyError::Transport(i32::from(status)));
    }
    info!("notify: sent '{}'", message);
    Ok(())
}

/// Deliver everything currently queued. Returns how many were sent.
pub fn drain_pending(channel: &NotifyChannel, poster: &mut impl HttpPost, api_url: &str) -> usize {
    let mut sent = 0;
    while let Ok(message) = channel.try_receive() {
        match deliver(poster, api_url, &message) {
            Ok(()) => sent += 1,
            Err(e) => warn!("notify: '{}' dropped: {}", message, e),
        }
    }
    sent
}

/// Delivery thread body. Blocks on the channel forever.
pub fn run_delivery(channel: &NotifyChannel, mut poster: impl HttpPost, api_url: &str) -> ! {
    info!("notify: delivering to {}/notify", api_url);
    loop {
        let message = futures_lite::future::block_on(channel.receive());
        if let Err(e) = deliver(&mut poster, api_url, &message) {
            warn!("notify: '{}' dropped: {}", message, e);
        }
    }
}

// ── Transports ────────────────────────────────────────────────

/// ESP-IDF `esp_http_client` transport.
#[cfg(feature = "espidf")]
pub struct EspHttpPoster {
    pub timeout_ms: i32,
}

#[cfg(feature = "espidf")]
impl HttpPost for EspHttpPoster {
    fn post_json(&mut self, url: &str, body: &str) -> Result<u16, NotifyError> {
        use esp_idf_svc::sys::*;

        let url_c = std::ffi::CString::new(url).map_err(|_| NotifyError::Transport(ESP_ERR_INVALID_ARG))?;
        // SAFETY: zeroed is the documented "all defaults" config.
        let mut config: esp_http_client_config_t = unsafe { core::mem::zeroed() };
        config.url = url_c.as_ptr();
        config.method = esp_http_client_method_t_HTTP_METHOD_POST;
        config.timeout_ms = self.timeout_ms;

        let client = unsafe { esp_http_client_init(&config) };
        if client.is_null() {
            return Err(NotifyError::Transport(ESP_FAIL));
        }
        // SAFETY: `client` is valid until cleanup; `body` outlives perform.
        let rc = unsafe {
            esp_http_client_set_header(client, c"Content-Type".as_ptr(), c"application/json".as_ptr());
            esp_http_client_set_post_field(client, body.as_ptr().cast(), body.len() as i32);
            esp_http_client_perform(client)
        };
        let status = unsafe { esp_http_client_get_status_code(client) };
        unsafe {
            esp_http_client_cleanup(client);
        }
        if rc != ESP_OK {
            return Err(NotifyError::Transport(rc));
        }
        Ok(status as u16)
    }
}

/// Host transport: logs the request and reports success.
#[cfg(not(feature = "espidf"))]
#[derive(Debug, Default)]
pub struct LogPoster;

#[cfg(not(feature = "espidf"))]
impl HttpPost for LogPoster {
    fn post_json(&mut self, url: &str, body: &str) -> Result<u16, NotifyError> {
        info!("notify: POST {} {}", url, body);
        Ok(200)
    }
}

// ── Platform time for the rate limiter ────────────────────────

#[cfg(feature = "espidf")]
fn platform_now() -> Duration {
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

#[cfg(not(feature = "espidf"))]
fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
