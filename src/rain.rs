//! # Rain Countdown
//!
//! Five pixels count down to the next likely rain: each lights once rain is
//! due within its threshold (5, 15, 30, 45 and 60 minutes). Every threshold is
//! checked on its own, so the lit pixels always form a run from the 60-minute
//! end inward.

use crate::{PixelFrame, Rgb, WeatherSnapshot};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Pixel for the 5-minute threshold; the others follow in order.
pub const RAIN_LIGHTS_END: u8 = 40;

/// Thresholds in minutes, in pixel order.
pub const RAIN_THRESHOLDS: [i64; 5] = [5, 15, 30, 45, 60];

pub const RAIN_COLOR: Rgb = Rgb::new(0, 25, 100);

/// Probability at which a minute counts as rain.
pub const RAIN_PROBABILITY: f64 = 0.5;

/// Assumed distance to rain when no minute in the forecast qualifies.
pub const NO_RAIN_MINUTES: i64 = 120;

/// Time of the first minute likely to see rain.
pub fn first_rain(snapshot: &WeatherSnapshot, now: DateTime<Utc>) -> DateTime<Utc> {
    snapshot
        .minutes
        .iter()
        .find(|m| m.precip_probability >= RAIN_PROBABILITY)
        .map(|m| m.time)
        .unwrap_or_else(|| now + Duration::minutes(NO_RAIN_MINUTES))
}

/// Which countdown pixels are lit, in pixel order.
pub fn lit_thresholds(first_rain: DateTime<Utc>, now: DateTime<Utc>) -> [bool; 5] {
    RAIN_THRESHOLDS.map(|minutes| first_rain <= now + Duration::minutes(minutes))
}

pub fn countdown<Tz: TimeZone>(snapshot: &WeatherSnapshot, now: &DateTime<Tz>) -> PixelFrame {
    let now = now.with_timezone(&Utc);
    let lit = lit_thresholds(first_rain(snapshot, now), now);

    let mut frame = PixelFrame::with_capacity(lit.len());
    for (offset, on) in lit.iter().enumerate() {
        let color = if *on { RAIN_COLOR } else { Rgb::BLACK };
        frame.set(RAIN_LIGHTS_END + offset as u8, color);
    }
    frame
}
