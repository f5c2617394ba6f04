//! # Weather Station Core Library
//!
//! This library drives a physical weather display built around a Raspberry Pi:
//! a stepper-positioned icon wheel, a chain of 48 addressable pixels, and two
//! servo gauges (temperature and tide). Pixels and servos are owned by a small
//! companion microcontroller (the "Trinket") that listens on the I2C bus.
//!
//! ## Pixel Layout
//!
//! | Pixels   | Purpose                                        |
//! |----------|------------------------------------------------|
//! | 0..=23   | Forecast ring, one pixel per upcoming hour     |
//! | 24..=36  | Temperature range gradient                     |
//! | 40..=44  | Rain countdown (5, 15, 30, 45, 60 minutes)     |
//!
//! ## Data Flow
//! 1. **Poll**: [`station::Station`] fetches a [`WeatherSnapshot`] every three minutes
//! 2. **Map**: [`temperature`], [`tides`], [`forecast`] and [`rain`] turn it into
//!    pixel frames and servo angles
//! 3. **Apply**: [`protocol::Trinket`] sends the frames, [`stepper::Stepper`] turns the wheel
//!
//! All hardware access goes through `embedded-hal` traits, so the same code runs
//! against Linux GPIO/I2C devices, the dry-run bindings in [`dry_run`], and the
//! recording mocks used in tests.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod audio;
pub mod config;
pub mod dry_run;
pub mod forecast;
pub mod protocol;
pub mod rain;
pub mod station;
pub mod stepper;
pub mod temperature;
pub mod tides;
pub mod weather_data;

#[cfg(test)]
mod tests;

/// Total number of pixels in the chain driven by the Trinket.
pub const NUM_PIXELS: u8 = 48;

/// Weather condition category, as named by the upstream data source.
///
/// Any icon the station does not know decodes to [`Icon::Unrecognised`]
/// instead of failing the whole snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    ClearDay,
    ClearNight,
    Rain,
    Snow,
    Sleet,
    Wind,
    Fog,
    Cloudy,
    PartlyCloudyDay,
    PartlyCloudyNight,
    #[serde(other)]
    Unrecognised,
}

impl Icon {
    /// Icons in the order they are printed around the wheel.
    pub const WHEEL: [Icon; 8] = [
        Icon::ClearDay,
        Icon::Cloudy,
        Icon::PartlyCloudyDay,
        Icon::Rain,
        Icon::ClearNight,
        Icon::Wind,
        Icon::PartlyCloudyNight,
        Icon::Snow,
    ];

    /// Fold conditions that have no slot of their own onto the closest one.
    pub fn normalized(self) -> Icon {
        match self {
            Icon::Sleet => Icon::Rain,
            Icon::Fog => Icon::Cloudy,
            other => other,
        }
    }

    /// Slot index on the wheel, after normalization.
    pub fn wheel_index(self) -> Option<usize> {
        let icon = self.normalized();
        Self::WHEEL.iter().position(|&i| i == icon)
    }

    /// Forecast ring color, after normalization.
    pub fn color(self) -> Option<Rgb> {
        let rgb = match self.normalized() {
            Icon::ClearDay => Rgb::new(40, 35, 0),
            Icon::Cloudy => Rgb::new(10, 10, 5),
            Icon::PartlyCloudyDay => Rgb::new(15, 15, 4),
            Icon::Rain => Rgb::new(0, 0, 200),
            Icon::ClearNight => Rgb::new(5, 5, 10),
            Icon::Wind => Rgb::new(5, 30, 5),
            Icon::PartlyCloudyNight => Rgb::new(5, 5, 8),
            Icon::Snow => Rgb::new(75, 0, 60),
            _ => return None,
        };
        Some(rgb)
    }
}

/// A single pixel color as sent to the Trinket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A run of pixel writes covering one region of the chain.
///
/// Frames are write-only: every rendering pass recomputes the whole region it
/// owns, so the station never needs to read pixel state back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelFrame {
    pub pixels: Vec<(u8, Rgb)>,
}

impl PixelFrame {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pixels: Vec::with_capacity(capacity),
        }
    }

    /// A frame painting every index in `range` black.
    pub fn blank(range: impl IntoIterator<Item = u8>) -> Self {
        Self {
            pixels: range.into_iter().map(|i| (i, Rgb::BLACK)).collect(),
        }
    }

    pub fn set(&mut self, index: u8, color: Rgb) {
        self.pixels.push((index, color));
    }

    /// Color of `index` as the Trinket will show it after this frame.
    ///
    /// Later writes to the same index win, matching the order they are sent.
    pub fn color_at(&self, index: u8) -> Option<Rgb> {
        self.pixels
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, c)| *c)
    }
}

/// How the forecast ring and tide gauge interpret position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    /// Position means "time from now"; re-anchored every poll.
    #[default]
    Sliding,
    /// Position means literal clock time.
    Fixed,
}

/// Precipitation probability for one upcoming minute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinuteForecast {
    pub time: DateTime<Utc>,
    pub precip_probability: f64,
}

/// Expected conditions for one upcoming hour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourForecast {
    pub time: DateTime<Utc>,
    pub icon: Icon,
}

/// Everything the station renders, fetched once per poll.
///
/// Tide times are local wall-clock times as published by the data source;
/// forecast times are absolute instants.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherSnapshot {
    pub current_icon: Icon,
    pub low_temp: f64,
    pub high_temp: f64,
    pub current_temp: f64,
    pub low_tides: Vec<NaiveDateTime>,
    pub high_tides: Vec<NaiveDateTime>,
    pub minutes: Vec<MinuteForecast>,
    pub hours: Vec<HourForecast>,
}
