//! # Weather Data Fetching
//!
//! The station polls a single URL that returns everything it shows as one
//! JSON document:
//!
//! ```json
//! {
//!   "currentIcon": "partly-cloudy-day",
//!   "lowTemp": 61.2, "highTemp": 78.9, "currentTemp": 70.4,
//!   "lowTides": ["2024-06-16 04:12", "2024-06-16 16:40"],
//!   "highTides": ["2024-06-16 10:25", "2024-06-16 22:51"],
//!   "minutes": [{ "time": 1718553600, "precipProbability": 0.1 }],
//!   "hours": [{ "time": 1718553600, "icon": "cloudy" }]
//! }
//! ```
//!
//! Tide times are local wall-clock strings; forecast times are unix seconds.
//!
//! ## Error Handling
//! Network, HTTP status and decode failures all surface as [`FetchError`].
//! The control loop treats any of them the same way: log it, skip this poll,
//! and try again at the next scheduled poll.

use crate::{HourForecast, Icon, MinuteForecast, WeatherSnapshot};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::info;
use serde::Deserialize;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Format of the tide time strings.
pub const TIDE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Errors that can occur while fetching or decoding a snapshot.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, timeout, or non-success status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not a valid snapshot document
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// A tide or forecast time could not be interpreted
    #[error("bad timestamp {0:?}")]
    Timestamp(String),

    /// The runtime driving the request could not be started
    #[error("runtime: {0}")]
    Runtime(#[from] io::Error),
}

/// Anything that can produce a fresh snapshot on demand.
pub trait WeatherSource {
    fn fetch(&mut self) -> Result<WeatherSnapshot, FetchError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    current_icon: Icon,
    low_temp: f64,
    high_temp: f64,
    current_temp: f64,
    #[serde(default)]
    low_tides: Vec<String>,
    #[serde(default)]
    high_tides: Vec<String>,
    #[serde(default)]
    minutes: Vec<RawMinute>,
    #[serde(default)]
    hours: Vec<RawHour>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMinute {
    time: i64,
    precip_probability: f64,
}

#[derive(Deserialize)]
struct RawHour {
    time: i64,
    icon: Icon,
}

fn tide_time(raw: &str) -> Result<NaiveDateTime, FetchError> {
    NaiveDateTime::parse_from_str(raw.trim(), TIDE_TIME_FORMAT)
        .map_err(|_| FetchError::Timestamp(raw.to_string()))
}

fn unix_time(secs: i64) -> Result<DateTime<Utc>, FetchError> {
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| FetchError::Timestamp(secs.to_string()))
}

/// Decode a snapshot document.
pub fn parse_snapshot(body: &[u8]) -> Result<WeatherSnapshot, FetchError> {
    let raw: RawSnapshot = serde_json::from_slice(body)?;

    let low_tides: Vec<NaiveDateTime> = raw
        .low_tides
        .iter()
        .map(|t| tide_time(t))
        .collect::<Result<_, _>>()?;
    let high_tides: Vec<NaiveDateTime> = raw
        .high_tides
        .iter()
        .map(|t| tide_time(t))
        .collect::<Result<_, _>>()?;

    let minutes: Vec<MinuteForecast> = raw
        .minutes
        .into_iter()
        .map(|m| {
            Ok(MinuteForecast {
                time: unix_time(m.time)?,
                precip_probability: m.precip_probability,
            })
        })
        .collect::<Result<_, FetchError>>()?;
    let hours: Vec<HourForecast> = raw
        .hours
        .into_iter()
        .map(|h| {
            Ok(HourForecast {
                time: unix_time(h.time)?,
                icon: h.icon,
            })
        })
        .collect::<Result<_, FetchError>>()?;

    Ok(WeatherSnapshot {
        current_icon: raw.current_icon,
        low_temp: raw.low_temp,
        high_temp: raw.high_temp,
        current_temp: raw.current_temp,
        low_tides,
        high_tides,
        minutes,
        hours,
    })
}

/// GET `url` and decode the body.
pub async fn fetch_snapshot(
    client: &reqwest::Client,
    url: &str,
) -> Result<WeatherSnapshot, FetchError> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    parse_snapshot(&body)
}

/// Blocking [`WeatherSource`] backed by an HTTP GET.
///
/// The station loop is synchronous, so each fetch is driven to completion on
/// a private single-threaded runtime.
pub struct HttpWeatherSource {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    url: String,
}

impl HttpWeatherSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            runtime,
            client,
            url: url.to_string(),
        })
    }
}

impl WeatherSource for HttpWeatherSource {
    fn fetch(&mut self) -> Result<WeatherSnapshot, FetchError> {
        info!("Loading remote data...");
        let snapshot = self
            .runtime
            .block_on(fetch_snapshot(&self.client, &self.url))?;
        info!("...success");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "currentIcon": "sleet",
        "lowTemp": 41.5,
        "highTemp": 79.0,
        "currentTemp": 60.2,
        "lowTides": ["2024-06-16 04:12", "2024-06-16 16:40"],
        "highTides": ["2024-06-16 10:25"],
        "minutes": [
            { "time": 1718553600, "precipProbability": 0.1 },
            { "time": 1718553660, "precipProbability": 0.62 }
        ],
        "hours": [
            { "time": 1718553600, "icon": "fog" },
            { "time": 1718557200, "icon": "hail" }
        ]
    }"#;

    #[test]
    fn decodes_full_document() {
        let snap = parse_snapshot(DOCUMENT.as_bytes()).unwrap();

        assert_eq!(snap.current_icon, Icon::Sleet);
        assert_eq!(snap.current_temp, 60.2);
        assert_eq!(snap.low_tides.len(), 2);
        assert_eq!(
            snap.high_tides[0],
            NaiveDateTime::parse_from_str("2024-06-16 10:25", TIDE_TIME_FORMAT).unwrap()
        );
        assert_eq!(snap.minutes[1].precip_probability, 0.62);
        assert_eq!(snap.minutes[1].time.timestamp(), 1718553660);
        assert_eq!(snap.hours[0].icon, Icon::Fog);
        assert_eq!(snap.hours[1].icon, Icon::Unrecognised);
    }

    #[test]
    fn missing_series_default_to_empty() {
        let body = r#"{"currentIcon":"wind","lowTemp":50,"highTemp":60,"currentTemp":55}"#;
        let snap = parse_snapshot(body.as_bytes()).unwrap();
        assert!(snap.low_tides.is_empty());
        assert!(snap.minutes.is_empty());
        assert!(snap.hours.is_empty());
    }

    #[test]
    fn malformed_tide_is_a_fetch_error() {
        let body = r#"{"currentIcon":"wind","lowTemp":50,"highTemp":60,"currentTemp":55,
                       "lowTides":["16/06/2024 4am"]}"#;
        assert!(matches!(
            parse_snapshot(body.as_bytes()),
            Err(FetchError::Timestamp(_))
        ));
    }

    #[test]
    fn missing_temperature_is_a_decode_error() {
        let body = r#"{"currentIcon":"wind","lowTemp":50,"highTemp":60}"#;
        assert!(matches!(
            parse_snapshot(body.as_bytes()),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn truncated_body_is_a_decode_error() {
        assert!(matches!(
            parse_snapshot(&DOCUMENT.as_bytes()[..40]),
            Err(FetchError::Decode(_))
        ));
    }
}
