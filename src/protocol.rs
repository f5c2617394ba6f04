//! # Trinket Command Protocol
//!
//! The Trinket listens on the I2C bus and owns the pixel chain and both servos.
//! Every command is a single write transaction: one opcode byte followed by a
//! fixed number of argument bytes.
//!
//! | Command       | Opcode | Arguments            |
//! |---------------|--------|----------------------|
//! | `SetPixel`    | `0x2B` | index, r, g, b       |
//! | `ShowPixels`  | `0x2C` | none                 |
//! | `SetServo`    | `0x3C` | servo id, angle      |
//!
//! Delivery is best effort. A frame the Trinket does not acknowledge is logged
//! and dropped; the display is allowed to miss a frame, the station is not
//! allowed to stop over it.

use crate::{PixelFrame, Rgb};
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use log::{debug, trace, warn};
use thiserror::Error;

/// Default 7-bit bus address of the Trinket.
pub const TRINKET_ADDRESS: u8 = 0x08;

pub const SET_PIXEL_CMD: u8 = 0x2B;
pub const SHOW_PIXELS_CMD: u8 = 0x2C;
pub const SET_SERVO_CMD: u8 = 0x3C;

pub const TIDE_SERVO: u8 = 0;
pub const TEMP_SERVO: u8 = 1;

/// Largest angle a servo accepts.
pub const MAX_SERVO_ANGLE: u8 = 180;

/// A single command understood by the Trinket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HardwareCommand {
    SetPixel { index: u8, color: Rgb },
    ShowPixels,
    SetServo { servo: u8, angle: u8 },
}

impl HardwareCommand {
    /// Servo command with the angle clamped into `[0, 180]`.
    pub fn servo(servo: u8, angle: i32) -> Self {
        HardwareCommand::SetServo {
            servo,
            angle: angle.clamp(0, MAX_SERVO_ANGLE as i32) as u8,
        }
    }

    /// Wire bytes for this command.
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            HardwareCommand::SetPixel { index, color } => {
                vec![SET_PIXEL_CMD, index, color.r, color.g, color.b]
            }
            HardwareCommand::ShowPixels => vec![SHOW_PIXELS_CMD],
            HardwareCommand::SetServo { servo, angle } => {
                vec![SET_SERVO_CMD, servo, angle.min(MAX_SERVO_ANGLE)]
            }
        }
    }
}

/// A bus write the Trinket did not complete.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("I2C write of {command:?} failed: {kind:?}")]
pub struct TransportError {
    pub command: HardwareCommand,
    pub kind: ErrorKind,
}

/// Exclusive hold on the bus for a single transaction.
///
/// The guard carries the `&mut` borrow of the bus, so two frames can never
/// interleave, and the hold ends when the guard drops whether the write
/// succeeded or not.
struct BusGuard<'a, I2C> {
    bus: &'a mut I2C,
    address: u8,
}

impl<'a, I2C: I2c> BusGuard<'a, I2C> {
    fn acquire(bus: &'a mut I2C, address: u8) -> Self {
        trace!("bus acquired for 0x{:02X}", address);
        Self { bus, address }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), I2C::Error> {
        self.bus.write(self.address, bytes)
    }
}

impl<I2C> Drop for BusGuard<'_, I2C> {
    fn drop(&mut self) {
        trace!("bus released for 0x{:02X}", self.address);
    }
}

/// Client for the Trinket on a shared I2C bus.
pub struct Trinket<I2C> {
    bus: I2C,
    address: u8,
}

impl<I2C: I2c> Trinket<I2C> {
    pub fn new(bus: I2C, address: u8) -> Self {
        Self { bus, address }
    }

    /// Transmit one command, reporting transport failures to the caller.
    pub fn try_send(&mut self, command: HardwareCommand) -> Result<(), TransportError> {
        let bytes = command.encode();
        let mut guard = BusGuard::acquire(&mut self.bus, self.address);
        guard.write(&bytes).map_err(|e| TransportError {
            command,
            kind: e.kind(),
        })
    }

    /// Transmit one command; a failed write is logged and dropped.
    pub fn send(&mut self, command: HardwareCommand) {
        if let Err(e) = self.try_send(command) {
            warn!("{}", e);
        }
    }

    /// Send every pixel in `frame` followed by a single show command.
    pub fn show_frame(&mut self, frame: &PixelFrame) {
        debug!("Sending {} pixel writes", frame.pixels.len());
        for &(index, color) in &frame.pixels {
            self.send(HardwareCommand::SetPixel { index, color });
        }
        self.send(HardwareCommand::ShowPixels);
    }

    pub fn set_servo(&mut self, servo: u8, angle: i32) {
        self.send(HardwareCommand::servo(servo, angle));
    }

    pub fn bus(&self) -> &I2C {
        &self.bus
    }

    pub fn into_inner(self) -> I2C {
        self.bus
    }
}
