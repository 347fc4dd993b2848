/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! The subset of the Si5351 register map touched when bringing up one output.
//!
//! Addresses and bit layouts follow Silicon Labs AN619.

use core::fmt;

use bitflags::bitflags;

use crate::Error;

/// Named single-byte registers. Synth parameter blocks are addressed through
/// [`FractionalMultisynth::base_addr`] instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Register {
    DeviceStatus = 0,
    OutputEnable = 3,
    Clk0 = 16,
    Clk1 = 17,
    Clk2 = 18,
    Clk3 = 19,
    Clk4 = 20,
    Clk5 = 21,
    Clk6 = 22,
    Clk7 = 23,
    Clk3_0DisableState = 24,
    Clk7_4DisableState = 25,
    PLLReset = 177,
}

impl Register {
    pub fn addr(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FeedbackMultisynth {
    MSNA,
    MSNB,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Multisynth {
    MS0,
    MS1,
    MS2,
    MS3,
    MS4,
    MS5,
}

/// A synth whose parameters occupy eight consecutive registers.
pub trait FractionalMultisynth {
    fn base_addr(&self) -> u8;

    fn register_range(&self) -> core::ops::RangeInclusive<u8> {
        self.base_addr()..=self.base_addr() + 7
    }
}

impl FractionalMultisynth for FeedbackMultisynth {
    fn base_addr(&self) -> u8 {
        match *self {
            FeedbackMultisynth::MSNA => 26,
            FeedbackMultisynth::MSNB => 34,
        }
    }
}

impl FractionalMultisynth for Multisynth {
    fn base_addr(&self) -> u8 {
        match *self {
            Multisynth::MS0 => 42,
            Multisynth::MS1 => 50,
            Multisynth::MS2 => 58,
            Multisynth::MS3 => 66,
            Multisynth::MS4 => 74,
            Multisynth::MS5 => 82,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClockOutput {
    Clk0 = 0,
    Clk1,
    Clk2,
    Clk3,
    Clk4,
    Clk5,
    Clk6,
    Clk7,
}

impl ClockOutput {
    pub const ALL: [ClockOutput; 8] = [
        ClockOutput::Clk0,
        ClockOutput::Clk1,
        ClockOutput::Clk2,
        ClockOutput::Clk3,
        ClockOutput::Clk4,
        ClockOutput::Clk5,
        ClockOutput::Clk6,
        ClockOutput::Clk7,
    ];

    pub fn from_index(ix: u8) -> Result<ClockOutput, Error> {
        ClockOutput::ALL
            .get(ix as usize)
            .copied()
            .ok_or(Error::InvalidParameter("clock output index must be 0-7"))
    }

    pub fn register(self) -> Register {
        match self {
            ClockOutput::Clk0 => Register::Clk0,
            ClockOutput::Clk1 => Register::Clk1,
            ClockOutput::Clk2 => Register::Clk2,
            ClockOutput::Clk3 => Register::Clk3,
            ClockOutput::Clk4 => Register::Clk4,
            ClockOutput::Clk5 => Register::Clk5,
            ClockOutput::Clk6 => Register::Clk6,
            ClockOutput::Clk7 => Register::Clk7,
        }
    }

    pub fn ix(&self) -> u8 {
        *self as u8
    }

    /// CLK6 and CLK7 are fed by integer-only synths with a different register
    /// layout, so fractional profiles cannot be loaded on them.
    pub fn multisynth(self) -> Result<Multisynth, Error> {
        match self {
            ClockOutput::Clk0 => Ok(Multisynth::MS0),
            ClockOutput::Clk1 => Ok(Multisynth::MS1),
            ClockOutput::Clk2 => Ok(Multisynth::MS2),
            ClockOutput::Clk3 => Ok(Multisynth::MS3),
            ClockOutput::Clk4 => Ok(Multisynth::MS4),
            ClockOutput::Clk5 => Ok(Multisynth::MS5),
            ClockOutput::Clk6 | ClockOutput::Clk7 => Err(Error::InvalidParameter(
                "CLK6 and CLK7 have no fractional multisynth",
            )),
        }
    }
}

impl fmt::Display for ClockOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CLK{}", self.ix())
    }
}

/// Post-divider stage after a multisynth (`R` in AN619).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputDivider {
    Div1 = 0,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

impl OutputDivider {
    pub fn bits(&self) -> u8 {
        *self as u8
    }

    pub fn from_bits(bits: u8) -> OutputDivider {
        match bits & 0b111 {
            0 => OutputDivider::Div1,
            1 => OutputDivider::Div2,
            2 => OutputDivider::Div4,
            3 => OutputDivider::Div8,
            4 => OutputDivider::Div16,
            5 => OutputDivider::Div32,
            6 => OutputDivider::Div64,
            _ => OutputDivider::Div128,
        }
    }

    pub fn denominator(&self) -> u32 {
        1 << self.bits()
    }
}

bitflags! {
    pub struct DeviceStatusBits: u8 {
        const SYS_INIT = 0b1000_0000;
        const LOL_B = 0b0100_0000;
        const LOL_A = 0b0010_0000;
        const LOS = 0b0001_0000;
    }
}

bitflags! {
    pub struct ClockControlBits: u8 {
        const CLK_PDN = 0b1000_0000;
        const MS_INT = 0b0100_0000;
        const MS_SRC = 0b0010_0000;
        const CLK_INV = 0b0001_0000;
        const CLK_SRC_MASK = 0b0000_1100;
        const CLK_SRC_XTAL = 0b0000_0000;
        const CLK_SRC_CLKIN = 0b0000_0100;
        const CLK_SRC_MS_ALT = 0b0000_1000;
        const CLK_SRC_MS = 0b0000_1100;
        const CLK_DRV_MASK = 0b0000_0011;
        const CLK_DRV_2 = 0b0000_0000;
        const CLK_DRV_4 = 0b0000_0001;
        const CLK_DRV_6 = 0b0000_0010;
        const CLK_DRV_8 = 0b0000_0011;
    }
}

bitflags! {
    pub struct PLLResetBits: u8 {
        const PLLB_RST = 0b1000_0000;
        const PLLA_RST = 0b0010_0000;
        // Set in every reset command from the Silicon Labs reference code.
        const RESERVED = 0b0000_1100;
    }
}

impl PLLResetBits {
    /// Soft reset of both PLLs.
    pub fn both() -> PLLResetBits {
        PLLResetBits::PLLA_RST | PLLResetBits::PLLB_RST | PLLResetBits::RESERVED
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DriveStrength {
    #[value(name = "2", alias = "2ma")]
    Drive2mA,
    #[value(name = "4", alias = "4ma")]
    Drive4mA,
    #[value(name = "6", alias = "6ma")]
    Drive6mA,
    #[default]
    #[value(name = "8", alias = "8ma")]
    Drive8mA,
}

impl DriveStrength {
    pub fn bits(self) -> ClockControlBits {
        match self {
            DriveStrength::Drive2mA => ClockControlBits::CLK_DRV_2,
            DriveStrength::Drive4mA => ClockControlBits::CLK_DRV_4,
            DriveStrength::Drive6mA => ClockControlBits::CLK_DRV_6,
            DriveStrength::Drive8mA => ClockControlBits::CLK_DRV_8,
        }
    }
}

/// Level an output is held at while it is disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DisableState {
    #[default]
    Low = 0,
    High = 1,
    #[value(name = "high-z")]
    HighImpedance = 2,
    /// Output keeps running even when its enable bit is cleared.
    Never = 3,
}

impl DisableState {
    /// Values for registers 24 (CLK3..0) and 25 (CLK7..4), two bits per
    /// output with the lowest-numbered output in the low bits.
    pub fn register_values(self) -> [u8; 2] {
        let s = self as u8;
        let byte = s | (s << 2) | (s << 4) | (s << 6);
        [byte, byte]
    }
}

/// Human-readable name for a register address, used in logs and plans.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterLabel(pub u8);

impl fmt::Display for RegisterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("device status"),
            3 => f.write_str("output enable control"),
            a @ 16..=23 => write!(f, "CLK{} control", a - 16),
            24 => f.write_str("CLK3-0 disable state"),
            25 => f.write_str("CLK7-4 disable state"),
            a @ 26..=33 => write!(f, "PLL A parameter {}", a - 26),
            a @ 34..=41 => write!(f, "PLL B parameter {}", a - 34),
            a @ 42..=89 => write!(f, "MS{} parameter {}", (a - 42) / 8, (a - 42) % 8),
            177 => f.write_str("PLL reset"),
            a => write!(f, "register {}", a),
        }
    }
}
