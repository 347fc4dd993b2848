/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Register encoding of the fractional synths.
//!
//! Both the PLL feedback synths and the output multisynths store a divide
//! ratio `a + b / c` as three integers:
//!
//! ```text
//! P1 = 128 * a + floor(128 * b / c) - 512
//! P2 = 128 * b - c * floor(128 * b / c)
//! P3 = c
//! ```
//!
//! packed into eight consecutive registers. Profiles ship these bytes as
//! literals; this module only exists to read them back (for logging and the
//! profile listing) and to cross-check the table.

use core::fmt;

use crate::registers::OutputDivider;
use crate::Error;

const P_MAX: u32 = 0xfffff;

/// A divide ratio `integer + num / denom`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ratio {
    pub integer: u32,
    pub num: u32,
    pub denom: u32,
}

impl Ratio {
    pub const fn new(integer: u32, num: u32, denom: u32) -> Ratio {
        Ratio {
            integer,
            num,
            denom,
        }
    }

    pub const fn int(integer: u32) -> Ratio {
        Ratio::new(integer, 0, 1)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num == 0 {
            write!(f, "{}", self.integer)
        } else {
            write!(f, "{} {}/{}", self.integer, self.num, self.denom)
        }
    }
}

/// The P1/P2/P3 triple plus the output divider, as stored on the chip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SynthParams {
    pub p1: u32,
    pub p2: u32,
    pub p3: u32,
    pub r_div: OutputDivider,
}

impl SynthParams {
    pub fn from_ratio(ratio: Ratio, r_div: OutputDivider) -> Result<SynthParams, Error> {
        if ratio.denom == 0 {
            return Err(Error::InvalidParameter("ratio denominator is zero"));
        }
        if ratio.num > P_MAX || ratio.denom > P_MAX {
            return Err(Error::InvalidParameter("ratio terms exceed 20 bits"));
        }
        if ratio.integer < 4 {
            return Err(Error::InvalidParameter("ratio integer part below 4"));
        }

        let (p1, p2, p3) = if ratio.num == 0 {
            (128 * ratio.integer - 512, 0, 1)
        } else {
            let frac = (128u64 * ratio.num as u64 / ratio.denom as u64) as u32;
            (
                128 * ratio.integer + frac - 512,
                128 * ratio.num - ratio.denom * frac,
                ratio.denom,
            )
        };

        if p1 > 0x3ffff {
            return Err(Error::InvalidParameter("ratio integer part exceeds 18 bits"));
        }

        Ok(SynthParams { p1, p2, p3, r_div })
    }

    pub fn from_registers(regs: &[u8; 8]) -> SynthParams {
        let p3 = ((regs[5] as u32 & 0xf0) << 12) | ((regs[0] as u32) << 8) | regs[1] as u32;
        let p1 = ((regs[2] as u32 & 0x03) << 16) | ((regs[3] as u32) << 8) | regs[4] as u32;
        let p2 = ((regs[5] as u32 & 0x0f) << 16) | ((regs[6] as u32) << 8) | regs[7] as u32;

        SynthParams {
            p1,
            p2,
            p3,
            r_div: OutputDivider::from_bits(regs[2] >> 4),
        }
    }

    pub fn to_registers(&self) -> [u8; 8] {
        let (p1, p2, p3) = (self.p1, self.p2, self.p3);
        [
            ((p3 & 0x0000FF00) >> 8) as u8,
            p3 as u8,
            ((p1 & 0x00030000) >> 16) as u8 | (self.r_div.bits() << 4),
            ((p1 & 0x0000FF00) >> 8) as u8,
            p1 as u8,
            (((p3 & 0x000F0000) >> 12) | ((p2 & 0x000F0000) >> 16)) as u8,
            ((p2 & 0x0000FF00) >> 8) as u8,
            p2 as u8,
        ]
    }

    /// The stored ratio as an exact fraction `(numerator, denominator)`.
    ///
    /// `a + b/c == (P1 + 512 + P2/P3) / 128`, so no precision is lost by
    /// going through P1..P3.
    pub fn fraction(&self) -> (u64, u64) {
        let p3 = self.p3.max(1) as u64;
        ((self.p1 as u64 + 512) * p3 + self.p2 as u64, 128 * p3)
    }

    /// True when the registers hold exactly `ratio`.
    pub fn encodes(&self, ratio: Ratio) -> bool {
        if ratio.denom == 0 {
            return false;
        }
        let (num, denom) = self.fraction();
        let expected = ratio.integer as u128 * ratio.denom as u128 + ratio.num as u128;
        num as u128 * ratio.denom as u128 == expected * denom as u128
    }

    pub fn ratio_f64(&self) -> f64 {
        let (num, denom) = self.fraction();
        num as f64 / denom as f64
    }

    pub fn is_integer(&self) -> bool {
        self.p2 == 0 && self.p1 % 128 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ratio_round_trips_through_registers() {
        let params = SynthParams::from_ratio(Ratio::int(394), OutputDivider::Div1).unwrap();
        assert_eq!(params.p1, 49920);
        assert_eq!(params.to_registers(), [0x00, 0x01, 0x00, 0xc3, 0x00, 0x00, 0x00, 0x00]);
        assert!(params.is_integer());
        assert!(params.encodes(Ratio::int(394)));
    }

    #[test]
    fn fractional_ratio_matches_reference_bytes() {
        let ratio = Ratio::new(27, 237381, 250000);
        let params = SynthParams::from_ratio(ratio, OutputDivider::Div1).unwrap();
        assert_eq!((params.p1, params.p2, params.p3), (3065, 134768, 250000));
        assert_eq!(
            params.to_registers(),
            [0xd0, 0x90, 0x00, 0x0b, 0xf9, 0x32, 0x0e, 0x70]
        );
        assert!(!params.is_integer());
    }

    #[test]
    fn decode_recovers_p_values_and_r_divider() {
        let params = SynthParams {
            p1: 0x2_1234,
            p2: 0xA_BCDE,
            p3: 0x5_6789,
            r_div: OutputDivider::Div16,
        };
        let regs = params.to_registers();
        assert_eq!(regs[2], 0x42);
        assert_eq!(SynthParams::from_registers(&regs), params);
        assert_eq!(OutputDivider::Div16.denominator(), 16);
    }

    #[test]
    fn encodes_compares_exactly() {
        let params = SynthParams::from_registers(&[0x31, 0x2d, 0x00, 0x0b, 0xbe, 0x10, 0xff, 0x1a]);
        assert!(params.encodes(Ratio::new(27, 38352, 78125)));
        assert!(!params.encodes(Ratio::new(27, 38353, 78125)));
        assert!((params.ratio_f64() - 27.490_905_6).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_terms() {
        assert!(SynthParams::from_ratio(Ratio::new(30, 1, 0), OutputDivider::Div1).is_err());
        assert!(SynthParams::from_ratio(Ratio::new(30, 1, 0x100000), OutputDivider::Div1).is_err());
        assert!(SynthParams::from_ratio(Ratio::int(2), OutputDivider::Div1).is_err());
    }

    #[test]
    fn ratio_display() {
        assert_eq!(Ratio::new(28, 457, 5000).to_string(), "28 457/5000");
        assert_eq!(Ratio::int(80).to_string(), "80");
    }
}
