//! GPIO line adapter.
//!
//! Implements [`LinePort`] over any `embedded-hal` 1.0 relay output and
//! sensor input. On the device these are esp-idf-hal `PinDriver`s; in
//! tests, plain fakes. Edge interrupts are armed through a caller-supplied
//! hook because `embedded-hal` has no interrupt API.

use embedded_hal::digital::{InputPin, PinState, StatefulOutputPin};
use log::{debug, warn};

use crate::app::ports::{Line, LinePort};
use crate::error::IoError;

pub struct HalLines<R, S, W> {
    relay: R,
    sensor: Option<S>,
    watch: W,
}

impl<R, S, W> HalLines<R, S, W>
where
    R: StatefulOutputPin,
    S: InputPin,
    W: FnMut() -> Result<(), i32>,
{
    /// `watch` arms both-edge interrupts on the sensor pin and returns the
    /// ESP-IDF error code on failure.
    pub fn new(relay: R, sensor: Option<S>, watch: W) -> Self {
        Self {
            relay,
            sensor,
            watch,
        }
    }
}

impl<R, S, W> LinePort for HalLines<R, S, W>
where
    R: StatefulOutputPin,
    S: InputPin,
    W: FnMut() -> Result<(), i32>,
{
    fn read_line(&mut self, line: Line) -> Result<PinState, IoError> {
        let high = match line {
            Line::Relay => self.relay.is_set_high().map_err(|_| IoError::Read(line))?,
            Line::Sensor => self
                .sensor
                .as_mut()
                .ok_or(IoError::Read(line))?
                .is_high()
                .map_err(|_| IoError::Read(line))?,
        };
        Ok(PinState::from(high))
    }

    fn write_line(&mut self, line: Line, level: PinState) -> Result<(), IoError> {
        match line {
            Line::Relay => {
                self.relay
                    .set_state(level)
                    .map_err(|_| IoError::Write(line))?;
                debug!("gpio: relay -> {:?}", level);
                Ok(())
            }
            Line::Sensor => Err(IoError::Write(line)),
        }
    }

    fn watch_line(&mut self, line: Line) -> Result<(), IoError> {
        if line != Line::Sensor || self.sensor.is_none() {
            return Err(IoError::Watch(line));
        }
        (self.watch)().map_err(|rc| {
            warn!("gpio: edge interrupt setup failed (rc={})", rc);
            IoError::Watch(line)
        })
    }
}
