//! Shared fixtures for unit and scenario tests.
//!
//! The recording mocks implement the same `embedded-hal` traits as the Linux
//! bindings, so the station under test is the one that runs on the Pi.

use crate::audio::Bell;
use crate::weather_data::{FetchError, WeatherSource};
use crate::{HourForecast, Icon, WeatherSnapshot};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital;
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use std::collections::VecDeque;
use std::convert::Infallible;


/// Offset used by every fixture timestamp (US Eastern, daylight time).
pub const OFFSET_SECS: i32 = -4 * 3600;

/// Local time in the fixture offset, `"YYYY-MM-DD HH:MM:SS"`.
pub fn at(local: &str) -> DateTime<FixedOffset> {
    let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S").unwrap();
    naive
        .and_local_timezone(FixedOffset::east_opt(OFFSET_SECS).unwrap())
        .unwrap()
}

/// Tide time as the data source publishes it, `"YYYY-MM-DD HH:MM"`.
pub fn tide(local: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M").unwrap()
}

/// Consecutive hourly forecast entries starting at `start`.
pub fn hourly(start: DateTime<FixedOffset>, icons: &[Icon]) -> Vec<HourForecast> {
    let start = start.with_timezone(&Utc);
    icons
        .iter()
        .enumerate()
        .map(|(i, &icon)| HourForecast {
            time: start + Duration::hours(i as i64),
            icon,
        })
        .collect()
}

/// A mild clear day with no tides or forecast series.
pub fn snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        current_icon: Icon::ClearDay,
        low_temp: 50.0,
        high_temp: 70.0,
        current_temp: 60.0,
        low_tides: Vec::new(),
        high_tides: Vec::new(),
        minutes: Vec::new(),
        hours: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl i2c::Error for BusFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// I2C bus that records every completed write.
///
/// Setting `fail_next` makes that many upcoming transactions fail without
/// being recorded.
#[derive(Debug, Default)]
pub struct RecordingBus {
    pub writes: Vec<(u8, Vec<u8>)>,
    pub fail_next: usize,
    pub attempts: usize,
}

impl RecordingBus {
    /// Recorded writes whose first byte is `opcode`.
    pub fn with_opcode(&self, opcode: u8) -> Vec<&[u8]> {
        self.writes
            .iter()
            .filter(|(_, bytes)| bytes.first() == Some(&opcode))
            .map(|(_, bytes)| bytes.as_slice())
            .collect()
    }
}

impl i2c::ErrorType for RecordingBus {
    type Error = BusFault;
}

impl i2c::I2c for RecordingBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(BusFault);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

/// Output pin remembering every level it was driven to.
#[derive(Debug, Default)]
pub struct RecordingPin {
    pub states: Vec<bool>,
}

impl digital::ErrorType for RecordingPin {
    type Error = Infallible;
}

impl digital::OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.states.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.states.push(true);
        Ok(())
    }
}

/// Delay that only adds up the time it was asked to wait.
#[derive(Debug, Default)]
pub struct CountingDelay {
    pub total_ms: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms as u64;
    }
}

/// Weather source replaying queued results, then repeating the baseline
/// snapshot once the queue is empty.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pub responses: VecDeque<Result<WeatherSnapshot, FetchError>>,
    pub fetches: usize,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<WeatherSnapshot, FetchError>>) -> Self {
        Self {
            responses: responses.into(),
            fetches: 0,
        }
    }
}

impl WeatherSource for ScriptedSource {
    fn fetch(&mut self) -> Result<WeatherSnapshot, FetchError> {
        self.fetches += 1;
        self.responses.pop_front().unwrap_or_else(|| Ok(snapshot()))
    }
}

/// Bell that counts rings.
#[derive(Debug, Default)]
pub struct CountingBell {
    pub rings: usize,
}

impl Bell for CountingBell {
    fn ring(&mut self) {
        self.rings += 1;
    }
}
