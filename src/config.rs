/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Command line options.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::profile::Profile;
use crate::registers::{ClockOutput, DisableState, DriveStrength};
use crate::sequencer::{OutputConfig, WritePolicy};
use crate::transport::DEFAULT_BUS;
use crate::Error;

#[derive(Debug, Parser)]
#[command(
    name = "si5351-atari",
    version,
    about = "Program an Si5351 to generate an Atari 8-bit system clock"
)]
pub struct Cli {
    /// Frequency profile: MHz value (e.g. 1.773447) or short name (e.g. xl-pal-1m77)
    #[arg(short, long, default_value = "1.773447")]
    pub profile: Profile,

    /// I2C bus device node
    #[arg(short, long, default_value = DEFAULT_BUS)]
    pub bus: PathBuf,

    /// 7-bit device address, hex (0x60) or decimal (96)
    #[arg(short, long, default_value = "0x60", value_parser = parse_address)]
    pub address: u8,

    /// Output to enable; the others are powered down
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub output: u8,

    /// Output drive strength in mA
    #[arg(long, value_enum, default_value_t = DriveStrength::Drive8mA)]
    pub drive: DriveStrength,

    /// Output level while disabled
    #[arg(long, value_enum, default_value_t = DisableState::Low)]
    pub disable_state: DisableState,

    /// What to do when a register write fails
    #[arg(long, value_enum, default_value_t = WritePolicy::Continue)]
    pub on_write_error: WritePolicy,

    /// Read the device status after loading and warn if PLL A has not locked
    #[arg(long)]
    pub check_lock: bool,

    /// Print the register writes without opening the bus
    #[arg(long)]
    pub dry_run: bool,

    /// List the available profiles and exit
    #[arg(long)]
    pub list: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Everything one run needs, resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub profile: Profile,
    pub bus: PathBuf,
    pub address: u8,
    pub output: OutputConfig,
    pub policy: WritePolicy,
    pub check_lock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            profile: Profile::default(),
            bus: PathBuf::from(DEFAULT_BUS),
            address: crate::sequencer::ADDRESS,
            output: OutputConfig::default(),
            policy: WritePolicy::default(),
            check_lock: false,
        }
    }
}

impl Cli {
    pub fn settings(&self) -> Result<Settings, Error> {
        Ok(Settings {
            profile: self.profile,
            bus: self.bus.clone(),
            address: self.address,
            output: OutputConfig {
                clock: ClockOutput::from_index(self.output)?,
                drive: self.drive,
                disable_state: self.disable_state,
            },
            policy: self.on_write_error,
            check_lock: self.check_lock,
        })
    }

    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn parse_address(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    }
    .map_err(|e| format!("`{}` is not an I2C address: {}", s, e))?;

    if value > 0x7f {
        return Err(format!("0x{:02x} is not a 7-bit I2C address", value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("si5351-atari").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_reproduce_the_reference_setup() {
        let settings = parse(&[]).settings().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.address, 0x60);
        assert_eq!(settings.bus, PathBuf::from("/dev/i2c-1"));
        assert_eq!(settings.profile, Profile::XlPalCpu);
        assert_eq!(settings.output.clock, ClockOutput::Clk0);
    }

    #[test]
    fn all_options() {
        let cli = parse(&[
            "--profile",
            "14.31818 MHz",
            "--bus",
            "/dev/i2c-3",
            "--address",
            "97",
            "--output",
            "2",
            "--drive",
            "4",
            "--disable-state",
            "high-z",
            "--on-write-error",
            "fail-fast",
            "--check-lock",
            "-vv",
        ]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.profile, Profile::XlNtscMaster);
        assert_eq!(settings.bus, PathBuf::from("/dev/i2c-3"));
        assert_eq!(settings.address, 0x61);
        assert_eq!(settings.output.clock, ClockOutput::Clk2);
        assert_eq!(settings.output.drive, DriveStrength::Drive4mA);
        assert_eq!(settings.output.disable_state, DisableState::HighImpedance);
        assert_eq!(settings.policy, WritePolicy::FailFast);
        assert!(settings.check_lock);
        assert_eq!(cli.log_filter(), "trace");
    }

    #[test]
    fn rejects_bad_values() {
        let bad: [&[&str]; 5] = [
            &["--profile", "2.0"],
            &["--address", "0x80"],
            &["--address", "sixty"],
            &["--output", "6"],
            &["-v", "-q"],
        ];
        for args in bad.iter() {
            let argv = std::iter::once("si5351-atari").chain(args.iter().copied());
            assert!(Cli::try_parse_from(argv).is_err(), "accepted {:?}", args);
        }
    }

    #[test]
    fn address_forms() {
        assert_eq!(parse_address("0x60"), Ok(0x60));
        assert_eq!(parse_address("0X61"), Ok(0x61));
        assert_eq!(parse_address("96"), Ok(0x60));
        assert!(parse_address("0x7f").is_ok());
        assert!(parse_address("0xff").is_err());
    }

    #[test]
    fn quiet_wins_over_default_level() {
        assert_eq!(parse(&["-q"]).log_filter(), "error");
        assert_eq!(parse(&[]).log_filter(), "info");
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
