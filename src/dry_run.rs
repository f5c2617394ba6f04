//! # Dry-Run Bindings
//!
//! Stand-ins for the Linux I2C and GPIO devices so the full station loop can
//! run on a development machine. The bus logs every frame it would have sent
//! and the coil pins do nothing, while timing is real so a wheel cycle takes
//! as long as it would on the Pi.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital;
use embedded_hal::i2c::{self, Operation};
use log::debug;
use std::convert::Infallible;
use std::thread;
use std::time::Duration;

/// I2C bus that logs writes at debug level and reads back zeros.
#[derive(Debug, Default)]
pub struct LoggingBus {
    writes: usize,
}

impl LoggingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write transactions seen so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl i2c::ErrorType for LoggingBus {
    type Error = Infallible;
}

impl i2c::I2c for LoggingBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.writes += 1;
                    debug!("i2c 0x{:02X} <- {:02X?}", address, bytes);
                }
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

/// Coil pin with nothing attached.
#[derive(Debug, Default)]
pub struct IdlePin;

impl digital::ErrorType for IdlePin {
    type Error = Infallible;
}

impl digital::OutputPin for IdlePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Blocking delay on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Trinket, TRINKET_ADDRESS};
    use crate::PixelFrame;
    use std::time::Instant;

    #[test]
    fn logging_bus_accepts_every_frame() {
        let mut trinket = Trinket::new(LoggingBus::new(), TRINKET_ADDRESS);
        trinket.show_frame(&PixelFrame::blank(0..5));
        assert_eq!(trinket.bus().writes(), 6);
    }

    #[test]
    fn sleep_delay_waits_at_least_as_asked() {
        let start = Instant::now();
        SleepDelay.delay_ms(5);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
