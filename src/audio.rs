//! Tide bell and startup volume, both delegated to external programs.

use crate::config::BellConfig;
use log::{debug, warn};
use std::process::Command;

/// Audible signal for a passing tide.
///
/// Ringing is fire-and-forget: a bell that fails to play is logged by the
/// implementation and never reported back to the station.
pub trait Bell {
    fn ring(&mut self);
}

/// Plays a sound asset through an external player such as `aplay`.
#[derive(Debug, Clone)]
pub struct CommandBell {
    program: String,
    asset: String,
    repeats: u32,
}

impl CommandBell {
    pub fn new(program: &str, asset: &str, repeats: u32) -> Self {
        Self {
            program: program.to_string(),
            asset: asset.to_string(),
            repeats,
        }
    }

    pub fn from_config(config: &BellConfig) -> Self {
        Self::new(&config.command, &config.asset, config.repeats)
    }
}

impl Bell for CommandBell {
    fn ring(&mut self) {
        // Sequential, so repeats play back to back rather than on top of each other
        for _ in 0..self.repeats {
            match Command::new(&self.program).arg(&self.asset).status() {
                Ok(status) if status.success() => debug!("Bell played {}", self.asset),
                Ok(status) => warn!("{} {} exited with {}", self.program, self.asset, status),
                Err(e) => warn!("Could not run {}: {}", self.program, e),
            }
        }
    }
}

/// Run the configured volume command once; failures are logged.
pub fn run_volume_command(argv: &[String]) {
    let Some((program, args)) = argv.split_first() else {
        return;
    };
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => debug!("Volume set with {}", program),
        Ok(output) => warn!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => warn!("Could not run {}: {}", program, e),
    }
}
