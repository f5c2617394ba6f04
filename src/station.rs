//! # Control Loop
//!
//! [`Station`] owns every piece of hardware and all mutable state. It wakes
//! once a second and decides two things independently:
//!
//! 1. **Poll**: every three minutes (and on the first tick) fetch a fresh
//!    snapshot and render it: temperature, conditions wheel, tides, forecast
//!    ring, rain countdown, in that order.
//! 2. **Hour signal**: when the local clock enters a new hour (and on the
//!    first tick) turn the wheel through one full revolution.
//!
//! The poll time is recorded before fetching, so a failing source is retried
//! at the normal cadence and never in a tight loop. Fetch and bus failures are
//! logged and the loop carries on; only losing track of the wheel position
//! stops the station.

use crate::audio::Bell;
use crate::config::Config;
use crate::protocol::{Trinket, TEMP_SERVO, TIDE_SERVO};
use crate::stepper::{PersistenceError, Stepper};
use crate::weather_data::{FetchError, WeatherSource};
use crate::{forecast, rain, temperature, tides};
use crate::{PixelFrame, TimeScale, WeatherSnapshot, NUM_PIXELS};
use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{debug, error, info, warn};
use std::convert::Infallible;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Time between ticks of [`Station::run`].
pub const TICK: Duration = Duration::from_secs(1);

/// Errors that stop the control loop.
#[derive(Error, Debug)]
pub enum TickError {
    #[error("wheel position lost: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Loop settings resolved once from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationSettings {
    pub poll_interval: chrono::Duration,
    pub time_scale: TimeScale,
    /// Pause between showing the temperature strip and moving its needle
    pub settle: Duration,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            poll_interval: chrono::Duration::minutes(3),
            time_scale: TimeScale::Sliding,
            settle: Duration::from_millis(100),
        }
    }
}

impl StationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.source.poll_interval(),
            time_scale: config.display.time_scale,
            settle: Duration::from_millis(config.hardware.settle_delay_ms),
        }
    }
}

/// Timestamps the loop schedules against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationState {
    /// Last poll attempt, successful or not
    pub last_poll: Option<DateTime<Utc>>,
    /// Last wheel cycle
    pub last_hour_signal: Option<DateTime<Utc>>,
    /// Tides at or before this time have been rung; never moves backward
    pub last_bell: DateTime<Utc>,
}

impl StationState {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            last_poll: None,
            last_hour_signal: None,
            last_bell: started_at,
        }
    }
}

/// What the poll half of a tick did.
#[derive(Debug)]
pub enum PollOutcome {
    NotDue,
    Rendered,
    Failed(FetchError),
}

/// Result of one tick of the loop.
#[derive(Debug)]
pub struct TickReport {
    pub poll: PollOutcome,
    pub cycled: bool,
}

/// The weather station: hardware, data source and schedule.
pub struct Station<I2C, P, D, S, B> {
    trinket: Trinket<I2C>,
    stepper: Stepper<P, D>,
    source: S,
    bell: B,
    settings: StationSettings,
    state: StationState,
}

/// Local (date, hour) used to detect the top of the hour, including midnight.
fn hour_key<Tz: TimeZone>(t: &DateTime<Tz>) -> (NaiveDate, u32) {
    (t.date_naive(), t.hour())
}

impl<I2C, P, D, S, B> Station<I2C, P, D, S, B>
where
    I2C: I2c,
    P: OutputPin,
    D: DelayNs,
    S: WeatherSource,
    B: Bell,
{
    pub fn new(
        trinket: Trinket<I2C>,
        stepper: Stepper<P, D>,
        source: S,
        bell: B,
        settings: StationSettings,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            trinket,
            stepper,
            source,
            bell,
            settings,
            state: StationState::new(started_at),
        }
    }

    /// Blank the whole pixel chain.
    pub fn startup(&mut self) {
        info!("Clearing {} pixels", NUM_PIXELS);
        self.trinket.show_frame(&PixelFrame::blank(0..NUM_PIXELS));
    }

    /// Run forever, one tick per second, reading the time from `clock`.
    pub fn run<Tz, F>(&mut self, mut clock: F) -> Result<Infallible, TickError>
    where
        Tz: TimeZone,
        F: FnMut() -> DateTime<Tz>,
    {
        self.startup();
        loop {
            let now = clock();
            self.tick(&now)?;
            thread::sleep(TICK);
        }
    }

    /// One pass of the loop at `now`.
    pub fn tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<TickReport, TickError> {
        let poll = self.poll(now)?;
        if let PollOutcome::Failed(e) = &poll {
            error!(
                "Poll failed, retrying in {} minutes: {}",
                self.settings.poll_interval.num_minutes(),
                e
            );
        }

        let cycled = self.hour_signal_due(now);
        if cycled {
            info!("Top of the hour or startup. Cycling icons.");
            self.stepper.cycle_icons();
            self.state.last_hour_signal = Some(now.with_timezone(&Utc));
        }

        Ok(TickReport { poll, cycled })
    }

    fn poll_due(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_poll {
            None => true,
            Some(last) => now - last > self.settings.poll_interval,
        }
    }

    fn hour_signal_due<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        match &self.state.last_hour_signal {
            None => true,
            Some(last) => hour_key(now) > hour_key(&last.with_timezone(&now.timezone())),
        }
    }

    fn poll<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<PollOutcome, TickError> {
        let now_utc = now.with_timezone(&Utc);
        if !self.poll_due(now_utc) {
            return Ok(PollOutcome::NotDue);
        }
        self.state.last_poll = Some(now_utc);

        match self.source.fetch() {
            Ok(snapshot) => {
                self.render(&snapshot, now)?;
                Ok(PollOutcome::Rendered)
            }
            Err(e) => Ok(PollOutcome::Failed(e)),
        }
    }

    fn render<Tz: TimeZone>(
        &mut self,
        snapshot: &WeatherSnapshot,
        now: &DateTime<Tz>,
    ) -> Result<(), PersistenceError> {
        self.show_temperature(snapshot);
        self.show_conditions(snapshot)?;
        self.show_tides(snapshot, now);

        let ring = forecast::ring(snapshot, now, self.settings.time_scale);
        self.trinket.show_frame(&ring);

        let countdown = rain::countdown(snapshot, now);
        self.trinket.show_frame(&countdown);
        Ok(())
    }

    fn show_temperature(&mut self, snapshot: &WeatherSnapshot) {
        let gauge = temperature::gauge(snapshot);
        debug!(
            "Temperature lights {}..={}, needle {}",
            gauge.low_light, gauge.high_light, gauge.angle
        );
        self.trinket.show_frame(&gauge.frame);
        thread::sleep(self.settings.settle);
        self.trinket.set_servo(TEMP_SERVO, gauge.angle);
    }

    fn show_conditions(&mut self, snapshot: &WeatherSnapshot) -> Result<(), PersistenceError> {
        info!("Current conditions: {:?}", snapshot.current_icon);
        let steps = self.stepper.move_to(snapshot.current_icon)?;
        debug!("Wheel moved {} steps", steps);
        Ok(())
    }

    fn show_tides<Tz: TimeZone>(&mut self, snapshot: &WeatherSnapshot, now: &DateTime<Tz>) {
        match tides::tide_angle(snapshot, now, self.settings.time_scale) {
            Some(angle) => self.trinket.set_servo(TIDE_SERVO, angle),
            None => warn!("No upcoming low tide, leaving tide gauge in place"),
        }

        if tides::bell_due(snapshot, now, &self.state.last_bell) {
            info!("Tide passed, ringing bell");
            self.bell.ring();
            self.state.last_bell = self.state.last_bell.max(now.with_timezone(&Utc));
        }
    }

    pub fn state(&self) -> &StationState {
        &self.state
    }

    pub fn trinket(&self) -> &Trinket<I2C> {
        &self.trinket
    }

    pub fn stepper(&self) -> &Stepper<P, D> {
        &self.stepper
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn bell(&self) -> &B {
        &self.bell
    }
}
