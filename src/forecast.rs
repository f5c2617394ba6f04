//! # Forecast Ring
//!
//! The first 24 pixels form a ring of upcoming hours, each colored by the
//! hour's expected conditions.
//!
//! - **Sliding**: pixel 23 is the current hour and the ring counts down from
//!   there, one pixel per forecast hour. Midnight is left dark so the day
//!   boundary stands out.
//! - **Fixed**: each pixel is a clock hour (pixel `23 - h` for hour `h`). The
//!   ring is painted for the next 21 hours, leaving a dark gap before the
//!   current hour comes round again.

use crate::{PixelFrame, Rgb, TimeScale, WeatherSnapshot};
use chrono::{DateTime, TimeZone, Timelike};
use log::debug;

pub const HOUR_LIGHTS: u8 = 24;

/// Hours painted in sliding mode.
pub const SLIDING_HOURS: usize = 24;

/// Hours painted in fixed mode.
pub const FIXED_HOURS: usize = 21;

/// Forecast hours from the current hour on, as (local hour of day, color).
fn upcoming<'a, Tz: TimeZone + 'a>(
    snapshot: &'a WeatherSnapshot,
    now: &DateTime<Tz>,
) -> impl Iterator<Item = (u32, Rgb)> + 'a {
    let tz = now.timezone();
    let current_hour = now.hour();

    snapshot
        .hours
        .iter()
        .map(move |h| {
            let color = h.icon.color().unwrap_or_else(|| {
                debug!("No forecast color for {:?}", h.icon);
                Rgb::BLACK
            });
            (h.time.with_timezone(&tz).hour(), color)
        })
        .skip_while(move |(hour, _)| *hour < current_hour)
}

pub fn sliding<Tz: TimeZone>(snapshot: &WeatherSnapshot, now: &DateTime<Tz>) -> PixelFrame {
    let mut frame = PixelFrame::blank(0..HOUR_LIGHTS);

    let positions = (0..HOUR_LIGHTS).rev().take(SLIDING_HOURS);
    for (pixel, (hour, color)) in positions.zip(upcoming(snapshot, now)) {
        if hour != 0 {
            frame.set(pixel, color);
        }
    }
    frame
}

pub fn fixed<Tz: TimeZone>(snapshot: &WeatherSnapshot, now: &DateTime<Tz>) -> PixelFrame {
    let mut frame = PixelFrame::blank(0..HOUR_LIGHTS);

    let start = (HOUR_LIGHTS as i64 - 1) - now.hour() as i64;
    for (k, (_, color)) in upcoming(snapshot, now).take(FIXED_HOURS).enumerate() {
        let pixel = (start - k as i64).rem_euclid(HOUR_LIGHTS as i64) as u8;
        frame.set(pixel, color);
    }
    frame
}

/// Ring frame for `now` under the configured time scale.
pub fn ring<Tz: TimeZone>(
    snapshot: &WeatherSnapshot,
    now: &DateTime<Tz>,
    scale: TimeScale,
) -> PixelFrame {
    match scale {
        TimeScale::Sliding => sliding(snapshot, now),
        TimeScale::Fixed => fixed(snapshot, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{at, hourly, snapshot};
    use crate::Icon;

    const CLEAR: Rgb = Rgb::new(40, 35, 0);
    const RAIN: Rgb = Rgb::new(0, 0, 200);

    #[test]
    fn sliding_ring_starts_at_current_hour() {
        let now = at("2024-06-16 13:20:00");
        let mut snap = snapshot();
        // Forecast starts two hours back, as the upstream API does
        snap.hours = hourly(at("2024-06-16 11:00:00"), &[Icon::Rain; 2]);
        snap.hours.extend(hourly(at("2024-06-16 13:00:00"), &[Icon::ClearDay, Icon::Sleet]));

        let frame = sliding(&snap, &now);
        assert_eq!(frame.color_at(23), Some(CLEAR));
        assert_eq!(frame.color_at(22), Some(RAIN));
        assert_eq!(frame.color_at(21), Some(Rgb::BLACK));
    }

    #[test]
    fn sliding_ring_leaves_midnight_dark() {
        let now = at("2024-06-16 22:00:00");
        let mut snap = snapshot();
        snap.hours = hourly(now, &[Icon::Cloudy; 30]);

        let frame = sliding(&snap, &now);
        assert_eq!(frame.color_at(23), Some(Rgb::new(10, 10, 5)));
        assert_eq!(frame.color_at(22), Some(Rgb::new(10, 10, 5)));
        // 22:00, 23:00, then midnight at pixel 21
        assert_eq!(frame.color_at(21), Some(Rgb::BLACK));
        assert_eq!(frame.color_at(20), Some(Rgb::new(10, 10, 5)));
        assert_eq!(frame.color_at(0), Some(Rgb::new(10, 10, 5)));
    }

    #[test]
    fn fixed_ring_places_hours_by_clock_and_wraps() {
        let now = at("2024-06-16 10:10:00");
        let mut snap = snapshot();
        snap.hours = hourly(at("2024-06-16 10:00:00"), &[Icon::Rain; 30]);

        let frame = fixed(&snap, &now);
        // 10:00 sits at pixel 13, the ring wraps past pixel 0 to 23 and stops
        // after 21 hours at pixel 17
        for lit in (0..=13).chain(17..=23) {
            assert_eq!(frame.color_at(lit), Some(RAIN), "pixel {}", lit);
        }
        for dark in 14..=16 {
            assert_eq!(frame.color_at(dark), Some(Rgb::BLACK), "pixel {}", dark);
        }
    }

    #[test]
    fn ring_always_clears_every_hour_pixel() {
        let now = at("2024-06-16 09:00:00");
        let frame = ring(&snapshot(), &now, TimeScale::Fixed);
        assert_eq!(frame.pixels.len(), HOUR_LIGHTS as usize);
        for i in 0..HOUR_LIGHTS {
            assert_eq!(frame.color_at(i), Some(Rgb::BLACK));
        }
    }

    #[test]
    fn unrecognised_icons_paint_black() {
        let now = at("2024-06-16 09:00:00");
        let mut snap = snapshot();
        snap.hours = hourly(now, &[Icon::Unrecognised, Icon::Snow]);

        let frame = ring(&snap, &now, TimeScale::Sliding);
        assert_eq!(frame.color_at(23), Some(Rgb::BLACK));
        assert_eq!(frame.color_at(22), Some(Rgb::new(75, 0, 60)));
    }
}
