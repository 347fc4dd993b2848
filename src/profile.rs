/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Precomputed frequency plans for Atari 8-bit clocks.
//!
//! Every plan runs PLL A from a 25 MHz crystal with a fractional feedback
//! divider between 600 and 900 MHz and feeds one output through an even,
//! integer multisynth divider with `R = 1`. The register bytes are literal;
//! `feedback` and `output_divider` document what they encode.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use crate::synth::{Ratio, SynthParams};

/// Crystal frequency all plans were computed for.
pub const REFERENCE_HZ: u32 = 25_000_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    #[default]
    XlPalCpu,
    XlNtscCpu,
    Ntsc400Cpu,
    XlPal2x,
    XlNtsc2x,
    Ntsc400Color,
    PalCrystal,
    Xf551Crystal,
    XlPalMaster,
    XlNtscMaster,
    /// Bring-up check: 800 MHz VCO divided by 80.
    Test10MHz,
}

#[derive(Debug)]
pub struct ProfileData {
    pub profile: Profile,
    /// Output frequency in MHz as written on the schematic; accepted on the
    /// command line.
    pub key: &'static str,
    /// Short alias, also accepted on the command line.
    pub name: &'static str,
    pub machine: &'static str,
    pub target_hz: f64,
    pub feedback: Ratio,
    pub output_divider: u32,
    /// Registers 26..=33.
    pub pll_a: [u8; 8],
    /// Eight registers starting at the selected output's multisynth base.
    pub multisynth: [u8; 8],
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown frequency profile `{0}` (use --list to see the available profiles)")]
pub struct ProfileParseError(pub String);

const fn ms_int(p1_high: u8) -> [u8; 8] {
    [0x00, 0x01, 0x00, p1_high, 0x00, 0x00, 0x00, 0x00]
}

pub static PROFILES: [ProfileData; 11] = [
    ProfileData {
        profile: Profile::XlPalCpu,
        key: "1.773447",
        name: "xl-pal-1m77",
        machine: "Atari XL/XE PAL",
        target_hz: 1_773_447.0,
        feedback: Ratio::new(27, 237381, 250000),
        output_divider: 394,
        pll_a: [0xd0, 0x90, 0x00, 0x0b, 0xf9, 0x32, 0x0e, 0x70],
        multisynth: ms_int(0xc3),
    },
    ProfileData {
        profile: Profile::XlNtscCpu,
        key: "1.7897725",
        name: "xl-ntsc-1m79",
        machine: "Atari XL/XE NTSC",
        target_hz: 1_789_772.5,
        feedback: Ratio::new(27, 920451, 1000000),
        output_divider: 390,
        pll_a: [0x42, 0x40, 0x00, 0x0b, 0xf5, 0xfc, 0x7a, 0x40],
        multisynth: ms_int(0xc1),
    },
    ProfileData {
        profile: Profile::Ntsc400Cpu,
        key: "1.7897875",
        name: "400-ntsc-1m79",
        machine: "Atari 400/800 NTSC",
        target_hz: 1_789_787.5,
        feedback: Ratio::new(27, 184137, 200000),
        output_divider: 390,
        pll_a: [0x0d, 0x40, 0x00, 0x0b, 0xf5, 0x32, 0x96, 0x40],
        multisynth: ms_int(0xc1),
    },
    ProfileData {
        profile: Profile::XlPal2x,
        key: "3.546894",
        name: "xl-pal-3m55",
        machine: "Atari XL/XE PAL",
        target_hz: 3_546_894.0,
        feedback: Ratio::new(28, 457, 5000),
        output_divider: 198,
        pll_a: [0x13, 0x88, 0x00, 0x0c, 0x0b, 0x00, 0x0d, 0xa8],
        multisynth: ms_int(0x61),
    },
    ProfileData {
        profile: Profile::XlNtsc2x,
        key: "3.579545",
        name: "xl-ntsc-3m58",
        machine: "Atari XL/XE NTSC",
        target_hz: 3_579_545.0,
        feedback: Ratio::new(28, 3977, 62500),
        output_divider: 196,
        pll_a: [0xf4, 0x24, 0x00, 0x0c, 0x08, 0x00, 0x23, 0x60],
        multisynth: ms_int(0x60),
    },
    ProfileData {
        profile: Profile::Ntsc400Color,
        key: "3.579575",
        name: "400-ntsc-3m58",
        machine: "Atari 400/800 NTSC",
        target_hz: 3_579_575.0,
        feedback: Ratio::new(28, 15967, 250000),
        output_divider: 196,
        pll_a: [0xd0, 0x90, 0x00, 0x0c, 0x08, 0x30, 0xab, 0x00],
        multisynth: ms_int(0x60),
    },
    ProfileData {
        profile: Profile::PalCrystal,
        key: "4.433618",
        name: "pal-crystal-4m43",
        machine: "Atari PAL crystal",
        target_hz: 4_433_618.0,
        feedback: Ratio::new(28, 12791, 625000),
        output_divider: 158,
        pll_a: [0x89, 0x68, 0x00, 0x0c, 0x02, 0x95, 0xe8, 0xb0],
        multisynth: ms_int(0x4d),
    },
    ProfileData {
        profile: Profile::Xf551Crystal,
        key: "8.3333",
        name: "xf551-8m33",
        machine: "Atari XF551 crystal",
        target_hz: 8_333_300.0,
        feedback: Ratio::new(28, 83319, 125000),
        output_divider: 86,
        pll_a: [0xe8, 0x48, 0x00, 0x0c, 0x55, 0x10, 0x9b, 0x98],
        multisynth: ms_int(0x29),
    },
    ProfileData {
        profile: Profile::XlPalMaster,
        key: "14.187576",
        name: "xl-pal-14m19",
        machine: "Atari XL/XE PAL",
        target_hz: 14_187_576.0,
        feedback: Ratio::new(28, 23447, 62500),
        output_divider: 50,
        pll_a: [0xf4, 0x24, 0x00, 0x0c, 0x30, 0x00, 0x04, 0xc0],
        multisynth: ms_int(0x17),
    },
    ProfileData {
        profile: Profile::XlNtscMaster,
        key: "14.31818",
        name: "xl-ntsc-14m32",
        machine: "Atari XL/XE NTSC",
        target_hz: 14_318_180.0,
        feedback: Ratio::new(27, 38352, 78125),
        output_divider: 48,
        pll_a: [0x31, 0x2d, 0x00, 0x0b, 0xbe, 0x10, 0xff, 0x1a],
        multisynth: ms_int(0x16),
    },
    ProfileData {
        profile: Profile::Test10MHz,
        key: "10",
        name: "test-10mhz",
        machine: "bring-up test",
        target_hz: 10_000_000.0,
        feedback: Ratio::int(32),
        output_divider: 80,
        pll_a: [0x00, 0x01, 0x00, 0x0e, 0x00, 0x00, 0x00, 0x00],
        multisynth: ms_int(0x26),
    },
];

impl Profile {
    pub const ATARI: [Profile; 10] = [
        Profile::XlPalCpu,
        Profile::XlNtscCpu,
        Profile::Ntsc400Cpu,
        Profile::XlPal2x,
        Profile::XlNtsc2x,
        Profile::Ntsc400Color,
        Profile::PalCrystal,
        Profile::Xf551Crystal,
        Profile::XlPalMaster,
        Profile::XlNtscMaster,
    ];

    pub fn data(self) -> &'static ProfileData {
        // PROFILES is declared in variant order.
        &PROFILES[self as usize]
    }

    pub fn all() -> &'static [ProfileData] {
        &PROFILES
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        write!(f, "{} MHz ({})", data.key, data.machine)
    }
}

impl FromStr for Profile {
    type Err = ProfileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let key = lowered.strip_suffix("mhz").unwrap_or(&lowered).trim_end();

        PROFILES
            .iter()
            .find(|p| p.key == key || p.name == key)
            .map(|p| p.profile)
            .ok_or_else(|| ProfileParseError(s.to_string()))
    }
}

impl ProfileData {
    pub fn pll_params(&self) -> SynthParams {
        SynthParams::from_registers(&self.pll_a)
    }

    pub fn multisynth_params(&self) -> SynthParams {
        SynthParams::from_registers(&self.multisynth)
    }

    /// VCO frequency the PLL A bytes produce from `reference_hz`.
    pub fn vco_hz(&self, reference_hz: u32) -> f64 {
        reference_hz as f64 * self.pll_params().ratio_f64()
    }

    /// Output frequency the register bytes produce from `reference_hz`.
    pub fn output_hz(&self, reference_hz: u32) -> f64 {
        let ms = self.multisynth_params();
        self.vco_hz(reference_hz) / ms.ratio_f64() / ms.r_div.denominator() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_in_variant_order() {
        for (ix, data) in PROFILES.iter().enumerate() {
            assert_eq!(data.profile as usize, ix);
            assert_eq!(data.profile.data().key, data.key);
        }
    }

    #[test]
    fn parses_keys_names_and_units() {
        assert_eq!("1.773447".parse::<Profile>(), Ok(Profile::XlPalCpu));
        assert_eq!("1.773447MHz".parse::<Profile>(), Ok(Profile::XlPalCpu));
        assert_eq!(" 1.773447 MHz ".parse::<Profile>(), Ok(Profile::XlPalCpu));
        assert_eq!("XL-NTSC-14M32".parse::<Profile>(), Ok(Profile::XlNtscMaster));
        assert_eq!("10".parse::<Profile>(), Ok(Profile::Test10MHz));
        assert_eq!(
            "1.77".parse::<Profile>(),
            Err(ProfileParseError("1.77".to_string()))
        );
    }

    #[test]
    fn keys_and_names_are_unique() {
        for (i, a) in PROFILES.iter().enumerate() {
            for b in PROFILES.iter().skip(i + 1) {
                assert_ne!(a.key, b.key);
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn default_is_pal_cpu_clock() {
        assert_eq!(Profile::default(), Profile::XlPalCpu);
        assert_eq!(Profile::default().to_string(), "1.773447 MHz (Atari XL/XE PAL)");
    }

    #[test]
    fn decoded_vco_matches_frequency_plan() {
        let data = Profile::XlPalCpu.data();
        assert!((data.vco_hz(REFERENCE_HZ) - 698_738_100.0).abs() < 1e-3);
        assert!((data.output_hz(REFERENCE_HZ) - 1_773_447.0).abs() < 0.1);
    }
}
