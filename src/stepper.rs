//! # Icon Wheel Stepper
//!
//! The icon wheel is turned by a unipolar stepper on four GPIO coil pins. The
//! controller only ever knows where the wheel is because it remembers where it
//! put it: the absolute step position is written to a plain-text file after
//! every move and read back at startup.
//!
//! ## Rotation Policy
//! Automatic moves always turn the wheel backward, even when forward would be
//! shorter. The persisted position only has to agree with the last
//! destination, so the direction does not matter for correctness, and a
//! single direction keeps gear backlash out of the alignment.
//!
//! [`Stepper::step_forward`] exists as the symmetric primitive for hand
//! calibration. Nothing in the control loop calls it.

use crate::Icon;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Steps between two neighbouring icons on the wheel.
pub const STEPS_PER_ICON: u32 = 384;

/// Steps in one full revolution of the wheel.
pub const TOTAL_STEPS: u32 = Icon::WHEEL.len() as u32 * STEPS_PER_ICON;

/// Dwell per coil pattern.
pub const STEP_DELAY_MS: u32 = 2;

/// Coil patterns (A1, A2, B1, B2) for one forward step.
const FORWARD_SEQUENCE: [[bool; 4]; 4] = [
    [true, true, false, false],
    [false, true, true, false],
    [false, false, true, true],
    [true, false, false, true],
];

/// Coil patterns for one backward step.
const BACKWARD_SEQUENCE: [[bool; 4]; 4] = [
    [true, false, false, true],
    [false, false, true, true],
    [false, true, true, false],
    [true, true, false, false],
];

/// Errors reading or writing the persisted wheel position.
///
/// A wheel that does not know where it is will silently show the wrong icon,
/// so none of these are recoverable.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("position file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("position file {} holds {contents:?}, not a step count", .path.display())]
    Corrupt { path: PathBuf, contents: String },

    #[error("position file {} holds {position}, outside 0..{}", .path.display(), TOTAL_STEPS)]
    OutOfRange { path: PathBuf, position: u32 },
}

/// Plain-text file holding the wheel's absolute step position.
#[derive(Debug, Clone)]
pub struct PositionFile {
    path: PathBuf,
}

impl PositionFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the stored position; a missing file means the wheel sits on the
    /// first icon.
    pub fn load(&self) -> Result<u32, PersistenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "No position file at {}, assuming wheel is at 0",
                    self.path.display()
                );
                return Ok(0);
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let position: u32 =
            contents
                .trim()
                .parse()
                .map_err(|_| PersistenceError::Corrupt {
                    path: self.path.clone(),
                    contents: contents.clone(),
                })?;

        if position >= TOTAL_STEPS {
            return Err(PersistenceError::OutOfRange {
                path: self.path.clone(),
                position,
            });
        }
        Ok(position)
    }

    pub fn save(&self, position: u32) -> Result<(), PersistenceError> {
        fs::write(&self.path, position.to_string()).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Backward distance from `current` to `destination` on a wheel of `total` steps.
///
/// Always in `[0, total)` when both inputs are.
pub fn backward_delta(current: u32, destination: u32, total: u32) -> u32 {
    let delta = current as i64 - destination as i64;
    if delta < 0 {
        (delta + total as i64) as u32
    } else {
        delta as u32
    }
}

/// Four-coil stepper turning the icon wheel.
pub struct Stepper<P, D> {
    coils: [P; 4],
    delay: D,
    step_delay_ms: u32,
    position: u32,
    store: PositionFile,
}

impl<P: OutputPin, D: DelayNs> Stepper<P, D> {
    /// Build the controller, recovering the wheel position from `store`.
    pub fn new(coils: [P; 4], delay: D, store: PositionFile) -> Result<Self, PersistenceError> {
        let position = store.load()?;
        info!("Wheel position recovered: {}", position);
        Ok(Self {
            coils,
            delay,
            step_delay_ms: STEP_DELAY_MS,
            position,
            store,
        })
    }

    pub fn with_step_delay_ms(mut self, step_delay_ms: u32) -> Self {
        self.step_delay_ms = step_delay_ms;
        self
    }

    /// Current absolute step position, always in `[0, TOTAL_STEPS)`.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Turn the wheel backward until `icon` is showing and persist the result.
    ///
    /// Returns the number of steps taken.
    pub fn move_to(&mut self, icon: Icon) -> Result<u32, PersistenceError> {
        let Some(index) = icon.wheel_index() else {
            warn!("{:?} has no slot on the wheel, leaving it in place", icon);
            return Ok(0);
        };

        let destination = index as u32 * STEPS_PER_ICON;
        let delta = backward_delta(self.position, destination, TOTAL_STEPS);
        debug!(
            "Moving wheel {} -> {} ({} steps back)",
            self.position, destination, delta
        );

        self.step_backward(delta);
        self.position = destination;
        self.store.save(self.position)?;
        Ok(delta)
    }

    /// One full backward revolution; the logical position does not change.
    pub fn cycle_icons(&mut self) {
        self.step_backward(TOTAL_STEPS);
    }

    pub fn step_backward(&mut self, steps: u32) {
        self.run(&BACKWARD_SEQUENCE, steps);
    }

    /// Forward primitive for hand calibration only. Does not update the
    /// tracked position.
    pub fn step_forward(&mut self, steps: u32) {
        self.run(&FORWARD_SEQUENCE, steps);
    }

    fn run(&mut self, sequence: &[[bool; 4]; 4], steps: u32) {
        for _ in 0..steps {
            for pattern in sequence {
                self.energize(*pattern);
                self.delay.delay_ms(self.step_delay_ms);
            }
        }
        // Idle coils only heat up
        self.energize([false; 4]);
    }

    fn energize(&mut self, pattern: [bool; 4]) {
        for (coil, on) in self.coils.iter_mut().zip(pattern) {
            if let Err(e) = coil.set_state(PinState::from(on)) {
                warn!("Coil write failed: {:?}", e);
            }
        }
    }

    pub fn coils(&self) -> &[P; 4] {
        &self.coils
    }
}
