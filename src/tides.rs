//! # Tide Gauge and Bell
//!
//! The tide servo points at the next low tide on a 12-hour dial. With the
//! sliding scale the dial reads "time until the tide"; with the fixed scale it
//! reads the tide's clock time. Tide times arrive as local wall-clock strings
//! and are placed in the timezone of `now`.
//!
//! Whenever a low or high tide passes, the bell rings once.

use crate::{TimeScale, WeatherSnapshot};
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use log::info;

pub const TIDE_ANGLE_START: f64 = 0.0;
pub const TIDE_ANGLE_END: f64 = 120.0;
pub const TIDE_MINUTES_START: i64 = 0;
pub const TIDE_MINUTES_END: i64 = 720;

fn localize<Tz: TimeZone>(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    // In the repeated DST hour take the first occurrence; skipped times are dropped
    tz.from_local_datetime(naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// First low tide in the published order that is strictly after `now`.
pub fn next_low_tide<Tz: TimeZone>(
    snapshot: &WeatherSnapshot,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    snapshot
        .low_tides
        .iter()
        .filter_map(|t| localize(t, &tz))
        .find(|t| *t > now_utc)
        .map(|t| t.with_timezone(&tz))
}

/// Dial minutes for `tide`, capped at the end of the dial.
pub fn minutes_for_tide<Tz: TimeZone>(
    tide: &DateTime<Tz>,
    now: &DateTime<Tz>,
    scale: TimeScale,
) -> i64 {
    let minutes = match scale {
        TimeScale::Sliding => {
            let until = tide.with_timezone(&Utc) - now.with_timezone(&Utc);
            until.num_seconds().div_euclid(60)
        }
        TimeScale::Fixed => (tide.hour() * 60 + tide.minute()) as i64,
    };
    minutes.min(TIDE_MINUTES_END)
}

pub fn angle_for_minutes(minutes: i64) -> i32 {
    let scale = (TIDE_ANGLE_END - TIDE_ANGLE_START) / (TIDE_MINUTES_END - TIDE_MINUTES_START) as f64
        + TIDE_ANGLE_START;
    ((minutes - TIDE_MINUTES_START) as f64 * scale) as i32
}

/// Servo angle for the next low tide, or `None` when the snapshot has no
/// future low tide.
pub fn tide_angle<Tz: TimeZone>(
    snapshot: &WeatherSnapshot,
    now: &DateTime<Tz>,
    scale: TimeScale,
) -> Option<i32> {
    let tide = next_low_tide(snapshot, now)?;
    let minutes = minutes_for_tide(&tide, now, scale);
    info!("Next tide at {}, {} minutes on the dial", tide.naive_local(), minutes);
    Some(angle_for_minutes(minutes))
}

/// Whether a tide has passed since the bell last rang.
///
/// Only one tide can trigger per call: the caller moves `last_bell` up to
/// `now` after ringing, which puts every tide up to `now` behind it.
pub fn bell_due<Tz: TimeZone>(
    snapshot: &WeatherSnapshot,
    now: &DateTime<Tz>,
    last_bell: &DateTime<Utc>,
) -> bool {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);

    snapshot
        .low_tides
        .iter()
        .chain(&snapshot.high_tides)
        .filter_map(|t| localize(t, &tz))
        .any(|tide| tide <= now_utc && tide > *last_bell)
}
