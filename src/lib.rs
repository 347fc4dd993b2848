/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
/*!
Loads fixed Atari 8-bit computer clock frequencies into an [Si5351] clock
generator over I²C.

## The Device

The Silicon Labs [Si5351] is an any-frequency CMOS clock generator. A crystal
reference feeds two PLLs (A and B); each output divides one PLL's VCO down
through its own multisynth.

This crate does not search for divider values. Each [`Profile`] carries
register bytes that were computed offline for one target frequency, and the
loader sends them in the order the chip requires:

1. disable all outputs,
2. power up the selected output (PLL A, integer multisynth) and power down
   the rest,
3. set the disable state,
4. write the PLL A feedback divider,
5. write the output multisynth divider,
6. soft-reset both PLLs,
7. enable the outputs.

## Usage

Any [`embedded-hal`] 0.2 blocking I²C implementation works. On Linux the
[`transport::I2cBus`] wrapper opens an `i2c-dev` node:

```no_run
use si5351_atari::transport::I2cBus;
use si5351_atari::{OutputConfig, Profile, Si5351Device, WritePolicy, ADDRESS};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let bus = I2cBus::open("/dev/i2c-1", ADDRESS)?;
let mut clock = Si5351Device::new(bus, ADDRESS);
let report = clock.configure(
    Profile::XlPalCpu.data(),
    &OutputConfig::default(),
    WritePolicy::Continue,
)?;
report.into_result()?;
# Ok(())
# }
```

[Si5351]: https://www.silabs.com/documents/public/data-sheets/Si5351-B.pdf
[`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
*/

pub mod app;
pub mod config;
pub mod profile;
pub mod registers;
pub mod sequencer;
pub mod synth;
pub mod transport;

use thiserror::Error;

pub use crate::profile::{Profile, ProfileData, ProfileParseError, REFERENCE_HZ};
pub use crate::registers::{ClockOutput, DeviceStatusBits, DisableState, DriveStrength};
pub use crate::sequencer::{
    bring_up_sequence, ApplyReport, OutputConfig, RegisterWrite, Si5351Device, WriteFailure,
    WritePolicy, ADDRESS,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("write to register {register} failed: {cause}")]
    Write { register: u8, cause: String },
    #[error("read of register {register} failed: {cause}")]
    Read { register: u8, cause: String },
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("{failed} of {planned} register writes failed, {skipped} skipped")]
    IncompleteConfiguration {
        failed: usize,
        skipped: usize,
        planned: usize,
    },
}
