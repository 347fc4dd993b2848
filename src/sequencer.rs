/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Output bring-up: the ordered register writes and the device that sends
//! them.

use core::fmt;

use embedded_hal::blocking::i2c::{Write, WriteRead};
use tracing::{debug, error, info};

use crate::profile::ProfileData;
use crate::registers::{
    ClockControlBits, ClockOutput, DeviceStatusBits, DisableState, DriveStrength,
    FeedbackMultisynth, FractionalMultisynth, PLLResetBits, Register, RegisterLabel,
};
use crate::Error;

/// Default 7-bit address of the Si5351 (A0 strapped low).
pub const ADDRESS: u8 = 0b0110_0000;

const ALL_OUTPUTS_DISABLED: u8 = 0xFF;
const ALL_OUTPUTS_ENABLED: u8 = 0x00;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterWrite {
    pub register: u8,
    pub value: u8,
}

impl RegisterWrite {
    pub const fn new(register: u8, value: u8) -> RegisterWrite {
        RegisterWrite { register, value }
    }

    pub fn label(&self) -> RegisterLabel {
        RegisterLabel(self.register)
    }
}

impl fmt::Display for RegisterWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reg {:3} <- 0x{:02x}  ({})",
            self.register,
            self.value,
            self.label()
        )
    }
}

/// Which output to bring up and how it behaves electrically.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub clock: ClockOutput,
    pub drive: DriveStrength,
    pub disable_state: DisableState,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            clock: ClockOutput::Clk0,
            drive: DriveStrength::Drive8mA,
            disable_state: DisableState::Low,
        }
    }
}

impl OutputConfig {
    /// Control byte for `clk`: the configured output runs from PLL A through
    /// its own integer-mode multisynth, every other output is powered down.
    pub fn control_byte(&self, clk: ClockOutput) -> u8 {
        if clk != self.clock {
            return ClockControlBits::CLK_PDN.bits();
        }
        (ClockControlBits::MS_INT | ClockControlBits::CLK_SRC_MS | self.drive.bits()).bits()
    }
}

/// Builds the complete bring-up sequence for `profile` on `output`.
///
/// The order is fixed: outputs off, clock control, disable state, PLL A,
/// output multisynth, PLL reset, outputs on. Divider registers must never be
/// written while outputs are enabled, and PLL A has to be reset after its
/// divider changes or it will not relock.
pub fn bring_up_sequence(
    profile: &ProfileData,
    output: &OutputConfig,
) -> Result<Vec<RegisterWrite>, Error> {
    let ms = output.clock.multisynth()?;
    let mut plan = Vec::with_capacity(29);

    plan.push(RegisterWrite::new(
        Register::OutputEnable.addr(),
        ALL_OUTPUTS_DISABLED,
    ));

    for &clk in ClockOutput::ALL.iter() {
        plan.push(RegisterWrite::new(
            clk.register().addr(),
            output.control_byte(clk),
        ));
    }

    let [low, high] = output.disable_state.register_values();
    plan.push(RegisterWrite::new(Register::Clk3_0DisableState.addr(), low));
    plan.push(RegisterWrite::new(Register::Clk7_4DisableState.addr(), high));

    let pll_base = FeedbackMultisynth::MSNA.base_addr();
    for (offset, &byte) in profile.pll_a.iter().enumerate() {
        plan.push(RegisterWrite::new(pll_base + offset as u8, byte));
    }

    let ms_base = ms.base_addr();
    for (offset, &byte) in profile.multisynth.iter().enumerate() {
        plan.push(RegisterWrite::new(ms_base + offset as u8, byte));
    }

    plan.push(RegisterWrite::new(
        Register::PLLReset.addr(),
        PLLResetBits::both().bits(),
    ));
    plan.push(RegisterWrite::new(
        Register::OutputEnable.addr(),
        ALL_OUTPUTS_ENABLED,
    ));

    Ok(plan)
}

/// What to do when a single register write fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WritePolicy {
    /// Log the failure and keep writing the rest of the sequence.
    #[default]
    Continue,
    /// Stop at the first failed write.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub write: RegisterWrite,
    pub cause: String,
}

/// Outcome of sending a plan to the device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyReport {
    pub planned: usize,
    pub attempted: usize,
    pub failures: Vec<WriteFailure>,
}

impl ApplyReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    /// Every planned write was attempted and none failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.attempted == self.planned
    }

    pub fn into_result(self) -> Result<ApplyReport, Error> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Error::IncompleteConfiguration {
                failed: self.failures.len(),
                skipped: self.planned - self.attempted,
                planned: self.planned,
            })
        }
    }
}

fn i2c_error<E: fmt::Debug>(e: E) -> String {
    format!("{:?}", e)
}

/// Si5351 attached to an I2C bus.
///
/// Owns the bus for its lifetime; dropping the device (or calling
/// [`Si5351Device::release`]) gives it up.
pub struct Si5351Device<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Si5351Device<I2C>
where
    I2C: Write<Error = E>,
    E: fmt::Debug,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Si5351Device { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn transfer(&mut self, reg: u8, byte: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[reg, byte])
    }

    pub fn write_register(&mut self, reg: u8, byte: u8) -> Result<(), Error> {
        self.transfer(reg, byte).map_err(|e| Error::Write {
            register: reg,
            cause: i2c_error(e),
        })
    }

    /// Sends `plan` one register at a time, in order.
    pub fn apply(&mut self, plan: &[RegisterWrite], policy: WritePolicy) -> ApplyReport {
        let mut report = ApplyReport {
            planned: plan.len(),
            ..ApplyReport::default()
        };

        for write in plan {
            report.attempted += 1;
            debug!("{}", write);

            if let Err(e) = self.transfer(write.register, write.value) {
                let cause = i2c_error(e);
                error!(
                    register = write.register,
                    "register write failed ({}): {}",
                    write.label(),
                    cause
                );
                report.failures.push(WriteFailure {
                    write: *write,
                    cause,
                });
                if policy == WritePolicy::FailFast {
                    break;
                }
            }
        }

        report
    }

    /// Builds and applies the bring-up sequence for `profile`.
    pub fn configure(
        &mut self,
        profile: &ProfileData,
        output: &OutputConfig,
        policy: WritePolicy,
    ) -> Result<ApplyReport, Error> {
        let plan = bring_up_sequence(profile, output)?;
        info!(
            "loading {} MHz ({}) on {} at 0x{:02x}",
            profile.key, profile.machine, output.clock, self.address
        );
        Ok(self.apply(&plan, policy))
    }
}

impl<I2C, E> Si5351Device<I2C>
where
    I2C: WriteRead<Error = E> + Write<Error = E>,
    E: fmt::Debug,
{
    fn read_register(&mut self, reg: Register) -> Result<u8, Error> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg.addr()], &mut buffer)
            .map_err(|e| Error::Read {
                register: reg.addr(),
                cause: i2c_error(e),
            })?;
        Ok(buffer[0])
    }

    pub fn read_device_status(&mut self) -> Result<DeviceStatusBits, Error> {
        Ok(DeviceStatusBits::from_bits_truncate(
            self.read_register(Register::DeviceStatus)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use crate::registers::Multisynth;

    #[test]
    fn default_plan_has_twenty_nine_writes() {
        let plan = bring_up_sequence(Profile::XlPalCpu.data(), &OutputConfig::default()).unwrap();
        assert_eq!(plan.len(), 29);
        assert_eq!(plan[0], RegisterWrite::new(3, 0xFF));
        assert_eq!(plan[1], RegisterWrite::new(16, 0x4F));
        assert_eq!(plan[27], RegisterWrite::new(177, 0xAC));
        assert_eq!(plan[28], RegisterWrite::new(3, 0x00));
    }

    #[test]
    fn selected_output_moves_multisynth_block_and_control_byte() {
        let output = OutputConfig {
            clock: ClockOutput::Clk2,
            drive: DriveStrength::Drive4mA,
            ..OutputConfig::default()
        };
        let plan = bring_up_sequence(Profile::XlNtscCpu.data(), &output).unwrap();

        let controls: Vec<u8> = plan[1..9].iter().map(|w| w.value).collect();
        assert_eq!(controls, [0x80, 0x80, 0x4D, 0x80, 0x80, 0x80, 0x80, 0x80]);

        let ms: Vec<u8> = plan[19..27].iter().map(|w| w.register).collect();
        assert_eq!(ms, Multisynth::MS2.register_range().collect::<Vec<u8>>());
        assert!(plan.iter().all(|w| !(42..=49).contains(&w.register)));
    }

    #[test]
    fn outputs_without_fractional_synth_are_rejected() {
        let output = OutputConfig {
            clock: ClockOutput::Clk7,
            ..OutputConfig::default()
        };
        assert!(bring_up_sequence(Profile::XlPalCpu.data(), &output).is_err());
    }

    #[test]
    fn disable_state_flows_into_registers_24_and_25() {
        let output = OutputConfig {
            disable_state: DisableState::HighImpedance,
            ..OutputConfig::default()
        };
        let plan = bring_up_sequence(Profile::XlPalCpu.data(), &output).unwrap();
        assert_eq!(plan[9], RegisterWrite::new(24, 0xAA));
        assert_eq!(plan[10], RegisterWrite::new(25, 0xAA));
    }

    #[test]
    fn write_display() {
        assert_eq!(
            RegisterWrite::new(26, 0xd0).to_string(),
            "reg  26 <- 0xd0  (PLL A parameter 0)"
        );
    }

    #[test]
    fn report_accounts_for_skipped_writes() {
        let report = ApplyReport {
            planned: 26,
            attempted: 4,
            failures: vec![WriteFailure {
                write: RegisterWrite::new(17, 0x80),
                cause: "nack".into(),
            }],
        };
        assert_eq!(report.succeeded(), 3);
        assert!(!report.is_complete());
        match report.into_result() {
            Err(Error::IncompleteConfiguration {
                failed,
                skipped,
                planned,
            }) => assert_eq!((failed, skipped, planned), (1, 22, 26)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
