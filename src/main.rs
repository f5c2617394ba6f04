//! # Weather Station Entry Point
//!
//! Loads configuration, binds the hardware and hands control to the station
//! loop, which runs until the process is killed or the wheel position can no
//! longer be persisted.
//!
//! ## Modes
//! - **Hardware** (default with the `hardware` feature on Linux): I2C bus and
//!   GPIO coil lines through `linux-embedded-hal`.
//! - **Dry run** (`--dry-run`, or any build without the feature): frames are
//!   logged instead of sent and the coil pins do nothing. Run with
//!   `RUST_LOG=debug` to see every command.

use anyhow::Context;
use chrono::{Local, Utc};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::info;
use std::env;
use weather_station_lib::audio::{self, CommandBell};
use weather_station_lib::config::Config;
use weather_station_lib::dry_run::{IdlePin, LoggingBus, SleepDelay};
use weather_station_lib::protocol::Trinket;
use weather_station_lib::station::{Station, StationSettings};
use weather_station_lib::stepper::{PositionFile, Stepper};
use weather_station_lib::weather_data::HttpWeatherSource;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let dry_run = args.iter().any(|arg| arg == "--dry-run");

    info!("Weather station {} starting", env!("CARGO_PKG_VERSION"));
    let config = Config::load();
    let url = config
        .source_url()
        .context("Cannot start without a weather source")?;

    audio::run_volume_command(&config.bell.volume_command);

    let source = HttpWeatherSource::new(&url, config.source.timeout())
        .context("Failed to build HTTP client")?;
    let bell = CommandBell::from_config(&config.bell);

    if dry_run {
        run_dry(&config, source, bell)
    } else {
        run_hardware(&config, source, bell)
    }
}

fn run_dry(config: &Config, source: HttpWeatherSource, bell: CommandBell) -> anyhow::Result<()> {
    info!("Dry run: I2C frames are logged, coil pins are idle");
    run_station(
        config,
        LoggingBus::new(),
        [IdlePin, IdlePin, IdlePin, IdlePin],
        SleepDelay,
        source,
        bell,
    )
}

#[cfg(all(target_os = "linux", feature = "hardware"))]
fn run_hardware(
    config: &Config,
    source: HttpWeatherSource,
    bell: CommandBell,
) -> anyhow::Result<()> {
    use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
    use linux_embedded_hal::{CdevPin, Delay, I2cdev};

    let hw = &config.hardware;
    let bus = I2cdev::new(&hw.i2c_bus).with_context(|| format!("open {}", hw.i2c_bus))?;
    let mut chip = Chip::new(&hw.gpio_chip).with_context(|| format!("open {}", hw.gpio_chip))?;

    let mut coil = |line: u32| -> anyhow::Result<CdevPin> {
        let handle = chip
            .get_line(line)
            .and_then(|l| l.request(LineRequestFlags::OUTPUT, 0, "weather-station"))
            .with_context(|| format!("request GPIO line {}", line))?;
        Ok(CdevPin::new(handle)?)
    };
    let [a1, a2, b1, b2] = hw.coil_pins;
    let coils = [coil(a1)?, coil(a2)?, coil(b1)?, coil(b2)?];

    info!(
        "Hardware bound: {} at 0x{:02X}, coils {:?} on {}",
        hw.i2c_bus, hw.trinket_address, hw.coil_pins, hw.gpio_chip
    );
    run_station(config, bus, coils, Delay, source, bell)
}

#[cfg(not(all(target_os = "linux", feature = "hardware")))]
fn run_hardware(
    config: &Config,
    source: HttpWeatherSource,
    bell: CommandBell,
) -> anyhow::Result<()> {
    log::warn!("Built without the hardware feature, falling back to dry run");
    run_dry(config, source, bell)
}

fn run_station<I2C, P, D>(
    config: &Config,
    bus: I2C,
    coils: [P; 4],
    delay: D,
    source: HttpWeatherSource,
    bell: CommandBell,
) -> anyhow::Result<()>
where
    I2C: I2c,
    P: OutputPin,
    D: DelayNs,
{
    let store = PositionFile::new(&config.state.position_file);
    let stepper = Stepper::new(coils, delay, store)
        .context("Failed to recover wheel position")?
        .with_step_delay_ms(config.hardware.step_delay_ms);
    let trinket = Trinket::new(bus, config.hardware.trinket_address);

    let mut station = Station::new(
        trinket,
        stepper,
        source,
        bell,
        StationSettings::from_config(config),
        Utc::now(),
    );

    let never = station.run(Local::now).context("Station stopped")?;
    match never {}
}
