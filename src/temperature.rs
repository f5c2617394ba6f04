//! # Temperature Gauge
//!
//! Two outputs show temperature: a 13-pixel strip lit across today's
//! low..high range with a blue→green→red gradient, and a servo needle pointing
//! at the current temperature. The strip covers 30°F to 90°F and the dial runs
//! on to 95°F; anything outside is clamped onto the scale rather than rejected.

use crate::{PixelFrame, Rgb, WeatherSnapshot};

pub const LOW_TEMP: f64 = 30.0;
pub const HIGH_TEMP: f64 = 90.0;

pub const TEMP_LIGHTS_START: u8 = 24;
pub const TEMP_LIGHTS_END: u8 = 36;

/// Servo angles at the cold and hot ends of the dial. The dial is mounted
/// reversed, so the needle sweeps from 170° (cold) toward -10° (hot).
pub const TEMP_ANGLE_START: f64 = -10.0;
pub const TEMP_ANGLE_END: f64 = 170.0;

const LIGHT_COUNT: usize = (TEMP_LIGHTS_END - TEMP_LIGHTS_START + 1) as usize;

/// Gradient across the strip: blue through green at the middle to red.
pub fn gradient() -> [Rgb; LIGHT_COUNT] {
    let half = (TEMP_LIGHTS_END - TEMP_LIGHTS_START) as usize / 2;
    let mut colors = [Rgb::BLACK; LIGHT_COUNT];

    for i in 0..half {
        let ratio = (30.0 * i as f64 / half as f64) as u8;
        colors[i] = Rgb::new(0, ratio, 30 - ratio);
        colors[half + 1 + i] = Rgb::new(ratio, 30 - ratio, 0);
    }
    colors[half] = Rgb::new(0, 30, 0);
    colors
}

/// Strip pixel for temperature `t`, in 5° buckets.
pub fn pixel_for_temp(t: f64) -> u8 {
    let light_range = LIGHT_COUNT as f64;
    let temp_range = HIGH_TEMP - LOW_TEMP;

    let bucket = (t / 5.0).floor() * 5.0;
    let p = ((bucket - LOW_TEMP) * (light_range / temp_range) + TEMP_LIGHTS_START as f64) as i64;

    // 90° maps one past the end of the strip
    p.clamp(TEMP_LIGHTS_START as i64, TEMP_LIGHTS_END as i64) as u8
}

/// Needle angle for temperature `t`, clamped to what the servo accepts.
pub fn angle_for_temp(t: f64) -> i32 {
    let angle_low = LOW_TEMP;
    let angle_high = HIGH_TEMP + 5.0;

    let angle_range = TEMP_ANGLE_END - TEMP_ANGLE_START;
    let temp_range = angle_high - angle_low;

    let raw = ((t - angle_low) * (angle_range / temp_range) + TEMP_ANGLE_START).floor();
    (TEMP_ANGLE_END - raw) as i32
}

/// Everything the temperature outputs need for one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct TemperatureGauge {
    pub low_light: u8,
    pub high_light: u8,
    pub frame: PixelFrame,
    pub angle: i32,
}

pub fn gauge(snapshot: &WeatherSnapshot) -> TemperatureGauge {
    let low = snapshot.low_temp.max(LOW_TEMP);
    let high = snapshot.high_temp.min(HIGH_TEMP);
    // Unclamped so the needle keeps moving past the top of the strip
    let current = if snapshot.current_temp.is_finite() {
        snapshot.current_temp
    } else {
        LOW_TEMP
    };

    let low_light = pixel_for_temp(low);
    let high_light = pixel_for_temp(high);

    let colors = gradient();
    let mut frame = PixelFrame::with_capacity(LIGHT_COUNT);
    for i in TEMP_LIGHTS_START..=TEMP_LIGHTS_END {
        let color = if i < low_light || i > high_light {
            Rgb::BLACK
        } else {
            colors[(i - TEMP_LIGHTS_START) as usize]
        };
        frame.set(i, color);
    }

    TemperatureGauge {
        low_light,
        high_light,
        frame,
        angle: angle_for_temp(current).clamp(0, 180),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::snapshot;
    use proptest::prelude::*;

    #[test]
    fn gradient_runs_blue_green_red() {
        let colors = gradient();
        assert_eq!(colors[0], Rgb::new(0, 0, 30));
        assert_eq!(colors[5], Rgb::new(0, 25, 5));
        assert_eq!(colors[6], Rgb::new(0, 30, 0));
        assert_eq!(colors[7], Rgb::new(0, 30, 0));
        assert_eq!(colors[12], Rgb::new(25, 5, 0));
    }

    #[test]
    fn scale_ends_land_on_the_strip() {
        assert_eq!(pixel_for_temp(30.0), TEMP_LIGHTS_START);
        assert_eq!(pixel_for_temp(90.0), TEMP_LIGHTS_END);
        assert_eq!(pixel_for_temp(-40.0), TEMP_LIGHTS_START);
        assert_eq!(pixel_for_temp(120.0), TEMP_LIGHTS_END);
    }

    #[test]
    fn temperatures_bucket_by_five_degrees() {
        assert_eq!(pixel_for_temp(40.0), 26);
        assert_eq!(pixel_for_temp(44.9), 26);
        assert_eq!(pixel_for_temp(60.0), 30);
        assert_eq!(pixel_for_temp(80.0), 34);
    }

    #[test]
    fn needle_angles_match_dial() {
        assert_eq!(angle_for_temp(30.0), 180);
        assert_eq!(angle_for_temp(60.0), 97);
        assert_eq!(angle_for_temp(90.0), 14);
    }

    #[test]
    fn range_is_lit_with_black_outside() {
        let mut snap = snapshot();
        snap.current_temp = 60.0;
        snap.low_temp = 40.0;
        snap.high_temp = 80.0;

        let gauge = gauge(&snap);
        assert_eq!((gauge.low_light, gauge.high_light), (26, 34));
        assert_eq!(gauge.angle, 97);
        assert_eq!(gauge.frame.pixels.len(), 13);

        let colors = gradient();
        for (i, color) in &gauge.frame.pixels {
            if (26..=34).contains(i) {
                assert_eq!(*color, colors[(*i - TEMP_LIGHTS_START) as usize]);
            } else {
                assert_eq!(*color, Rgb::BLACK, "pixel {} should be dark", i);
            }
        }
    }

    #[test]
    fn extreme_weather_is_clamped() {
        let mut snap = snapshot();
        snap.current_temp = 120.0;
        snap.low_temp = -20.0;
        snap.high_temp = 120.0;

        let gauge = gauge(&snap);
        assert_eq!((gauge.low_light, gauge.high_light), (24, 36));
        assert_eq!(gauge.angle, 0);

        snap.current_temp = -20.0;
        assert_eq!(super::gauge(&snap).angle, 180);

        snap.current_temp = f64::NAN;
        assert_eq!(super::gauge(&snap).angle, 180);
    }

    #[test]
    fn needle_keeps_moving_above_the_strip() {
        let mut snap = snapshot();
        let angle_at = |snap: &mut WeatherSnapshot, t: f64| {
            snap.current_temp = t;
            gauge(snap).angle
        };

        assert_eq!(angle_at(&mut snap, 90.0), 14);
        assert_eq!(angle_at(&mut snap, 92.0), 9);
        assert_eq!(angle_at(&mut snap, 94.0), 3);
        assert_eq!(angle_at(&mut snap, 95.0), 0);
        assert_eq!(angle_at(&mut snap, 100.0), 0);
    }

    proptest! {
        #[test]
        fn angle_stays_on_dial(t in LOW_TEMP..=HIGH_TEMP) {
            let angle = angle_for_temp(t);
            prop_assert!((0..=180).contains(&angle));
        }

        #[test]
        fn angle_never_rises_with_temperature(a in LOW_TEMP..=HIGH_TEMP, b in LOW_TEMP..=HIGH_TEMP) {
            let (cold, hot) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(angle_for_temp(hot) <= angle_for_temp(cold));
        }

        #[test]
        fn pixel_stays_on_strip(t in -100.0f64..200.0) {
            let p = pixel_for_temp(t);
            prop_assert!((TEMP_LIGHTS_START..=TEMP_LIGHTS_END).contains(&p));
        }
    }
}
