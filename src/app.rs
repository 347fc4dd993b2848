/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! One run of the loader: open the bus, send the sequence, report.

use std::fmt::Debug;
use std::io;
use std::path::Path;

use embedded_hal::blocking::i2c::{Write, WriteRead};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::profile::{Profile, ProfileData, REFERENCE_HZ};
use crate::registers::DeviceStatusBits;
use crate::sequencer::{bring_up_sequence, ApplyReport, RegisterWrite, Si5351Device};
use crate::transport::TransportError;
use crate::Error;

pub const EXIT_OK: u8 = 0;
/// Nothing was written: the bus could not be opened or the settings are unusable.
pub const EXIT_FAILURE: u8 = 1;
/// Some writes failed; the device may be partially configured.
pub const EXIT_INCOMPLETE: u8 = 2;

#[derive(Debug)]
pub enum Outcome {
    /// Every register was written.
    Configured(ApplyReport),
    /// At least one write failed or was skipped.
    Incomplete(ApplyReport),
    /// The bus could not be opened; nothing was written.
    OpenFailed(TransportError),
    /// The settings do not describe a loadable configuration.
    Invalid(Error),
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Configured(_) => EXIT_OK,
            Outcome::OpenFailed(_) | Outcome::Invalid(_) => EXIT_FAILURE,
            Outcome::Incomplete(_) => EXIT_INCOMPLETE,
        }
    }
}

/// Loads `settings.profile` through a bus obtained from `open`.
///
/// `open` is only called once the plan has been built, and the bus it returns
/// is dropped before this function returns.
pub fn run<I2C, E, F>(settings: &Settings, open: F) -> Outcome
where
    F: FnOnce(&Path, u8) -> Result<I2C, TransportError>,
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Debug,
{
    let profile = settings.profile.data();
    log_frequency_plan(profile);

    let plan = match bring_up_sequence(profile, &settings.output) {
        Ok(plan) => plan,
        Err(e) => {
            error!("{}", e);
            return Outcome::Invalid(e);
        }
    };

    let bus = match open(&settings.bus, settings.address) {
        Ok(bus) => bus,
        Err(e) => {
            let causes = source_chain(&e);
            if causes.is_empty() {
                error!("{}", e);
            } else {
                error!("{}: {}", e, causes);
            }
            return Outcome::OpenFailed(e);
        }
    };

    let mut device = Si5351Device::new(bus, settings.address);
    let report = device.apply(&plan, settings.policy);

    if settings.check_lock {
        match device.read_device_status() {
            Ok(status) => log_device_status(status),
            Err(e) => warn!("could not read device status: {}", e),
        }
    }
    drop(device);

    if report.is_complete() {
        info!("{} register writes completed", report.succeeded());
        println!(
            "The setup for {} has been completed.",
            settings.output.clock
        );
        Outcome::Configured(report)
    } else {
        let summary = Error::IncompleteConfiguration {
            failed: report.failures.len(),
            skipped: report.planned - report.attempted,
            planned: report.planned,
        };
        error!("{}", summary);
        Outcome::Incomplete(report)
    }
}

fn source_chain(e: &dyn std::error::Error) -> String {
    let mut causes = Vec::new();
    let mut source = e.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes.join(": ")
}

fn log_frequency_plan(profile: &ProfileData) {
    info!(
        "profile {} MHz ({}): VCO {:.6} MHz, output {:.6} MHz",
        profile.key,
        profile.machine,
        profile.vco_hz(REFERENCE_HZ) / 1e6,
        profile.output_hz(REFERENCE_HZ) / 1e6
    );
}

fn log_device_status(status: DeviceStatusBits) {
    if status.contains(DeviceStatusBits::SYS_INIT) {
        warn!("device is still initialising");
    }
    if status.contains(DeviceStatusBits::LOS) {
        warn!("reference clock lost (LOS)");
    }
    if status.contains(DeviceStatusBits::LOL_A) {
        warn!("PLL A has not locked");
    } else {
        info!("PLL A locked");
    }
}

/// Writes the profile table, one line per profile.
pub fn write_profile_table<W: io::Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{:<10} {:<17} {:<20} {:>14} {:>14} {:>6}",
        "MHz", "name", "machine", "feedback", "VCO MHz", "div"
    )?;
    for data in Profile::all() {
        writeln!(
            out,
            "{:<10} {:<17} {:<20} {:>14} {:>14.6} {:>6}",
            data.key,
            data.name,
            data.machine,
            data.feedback.to_string(),
            data.vco_hz(REFERENCE_HZ) / 1e6,
            data.output_divider
        )?;
    }
    Ok(())
}

/// Writes `plan` as it would be sent to the device at `address`.
pub fn write_plan<W: io::Write>(
    out: &mut W,
    address: u8,
    plan: &[RegisterWrite],
) -> io::Result<()> {
    writeln!(out, "# {} writes to device 0x{:02x}", plan.len(), address)?;
    for write in plan {
        writeln!(out, "{}", write)?;
    }
    Ok(())
}
