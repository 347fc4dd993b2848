/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Linux `i2c-dev` bus exposed through the embedded-hal blocking I²C traits.
//!
//! The device node is opened and bound to the slave address in
//! [`I2cBus::open`]; the file descriptor is closed when the bus is dropped.
//! Every operation goes out as one `I2C_RDWR` transfer, so a register write
//! or status read either completes or fails.

use std::path::PathBuf;

use thiserror::Error;

/// Bus used when none is configured (header pins 3/5 on a Raspberry Pi).
pub const DEFAULT_BUS: &str = "/dev/i2c-1";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open I2C bus {} for device 0x{address:02x}", .path.display())]
    Open {
        path: PathBuf,
        address: u8,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("0x{0:02x} is not a 7-bit I2C address")]
    InvalidAddress(u8),
    #[error("I2C device access is only supported on Linux/Android")]
    Unsupported,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use self::linux::{BusError, I2cBus};

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub use self::unsupported::I2cBus;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux {
    use std::path::{Path, PathBuf};

    use embedded_hal::blocking::i2c::{Write, WriteRead};
    use i2cdev::core::{I2CMessage, I2CTransfer};
    use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError, LinuxI2CMessage};
    use thiserror::Error;
    use tracing::debug;

    use super::TransportError;

    #[derive(Debug, Error)]
    pub enum BusError {
        #[error(transparent)]
        Linux(#[from] LinuxI2CError),
        #[error("only {transferred} of {expected} I2C messages were transferred")]
        Incomplete { transferred: u32, expected: u32 },
    }

    /// A combined transfer only counts when the adapter reports every
    /// message done.
    fn check_transferred(transferred: u32, expected: u32) -> Result<(), BusError> {
        if transferred == expected {
            Ok(())
        } else {
            Err(BusError::Incomplete {
                transferred,
                expected,
            })
        }
    }

    pub struct I2cBus {
        device: LinuxI2CDevice,
        path: PathBuf,
    }

    impl I2cBus {
        /// Opens `path` and binds it to the 7-bit `address`.
        pub fn open<P: AsRef<Path>>(path: P, address: u8) -> Result<I2cBus, TransportError> {
            let path = path.as_ref().to_path_buf();
            if address > 0x7f {
                return Err(TransportError::InvalidAddress(address));
            }

            let device = LinuxI2CDevice::new(&path, u16::from(address)).map_err(|e| {
                TransportError::Open {
                    path: path.clone(),
                    address,
                    source: Box::new(e),
                }
            })?;
            debug!("opened {} for 0x{:02x}", path.display(), address);

            Ok(I2cBus { device, path })
        }
    }

    impl Write for I2cBus {
        type Error = BusError;

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
            let mut messages = [LinuxI2CMessage::write(bytes).with_address(u16::from(address))];
            let transferred = self.device.transfer(&mut messages)?;
            check_transferred(transferred, 1)
        }
    }

    impl WriteRead for I2cBus {
        type Error = BusError;

        fn write_read(
            &mut self,
            address: u8,
            bytes: &[u8],
            buffer: &mut [u8],
        ) -> Result<(), BusError> {
            let address = u16::from(address);
            let mut messages = [
                LinuxI2CMessage::write(bytes).with_address(address),
                LinuxI2CMessage::read(buffer).with_address(address),
            ];
            let transferred = self.device.transfer(&mut messages)?;
            check_transferred(transferred, 2)
        }
    }

    impl Drop for I2cBus {
        fn drop(&mut self) {
            debug!("closing {}", self.path.display());
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn partial_transfer_is_an_error() {
            assert!(check_transferred(1, 1).is_ok());
            assert!(check_transferred(2, 2).is_ok());

            let err = check_transferred(1, 2).unwrap_err();
            assert!(matches!(
                err,
                BusError::Incomplete {
                    transferred: 1,
                    expected: 2
                }
            ));
            assert_eq!(err.to_string(), "only 1 of 2 I2C messages were transferred");
            assert!(check_transferred(0, 1).is_err());
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod unsupported {
    use core::convert::Infallible;
    use std::path::Path;

    use embedded_hal::blocking::i2c::{Write, WriteRead};

    use super::TransportError;

    /// Placeholder on platforms without `i2c-dev`; it can never be opened.
    pub enum I2cBus {}

    impl I2cBus {
        pub fn open<P: AsRef<Path>>(_path: P, _address: u8) -> Result<I2cBus, TransportError> {
            Err(TransportError::Unsupported)
        }
    }

    impl Write for I2cBus {
        type Error = Infallible;

        fn write(&mut self, _address: u8, _bytes: &[u8]) -> Result<(), Infallible> {
            match *self {}
        }
    }

    impl WriteRead for I2cBus {
        type Error = Infallible;

        fn write_read(
            &mut self,
            _address: u8,
            _bytes: &[u8],
            _buffer: &mut [u8],
        ) -> Result<(), Infallible> {
            match *self {}
        }
    }
}
