/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! In-memory Si5351 on a fake I2C bus.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::blocking::i2c::{Write, WriteRead};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// The device did not acknowledge a transfer to this register.
    Nack(u8),
    /// Transfer addressed to a device that is not on the bus.
    NoDevice(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub address: u8,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct BusLog {
    pub address: u8,
    pub transfers: Vec<Transfer>,
    pub registers: Vec<u8>,
    pub failing: Vec<u8>,
}

impl Default for BusLog {
    fn default() -> Self {
        BusLog {
            address: 0x60,
            transfers: Vec::new(),
            registers: vec![0; 256],
            failing: Vec::new(),
        }
    }
}

/// Cloning shares the same log, so a test can keep a handle while the
/// device under test owns the bus.
#[derive(Debug, Clone, Default)]
pub struct MockSi5351(pub Rc<RefCell<BusLog>>);

impl MockSi5351 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(registers: &[u8]) -> Self {
        let mock = Self::new();
        mock.0.borrow_mut().failing.extend_from_slice(registers);
        mock
    }

    pub fn set_status(&self, status: u8) {
        self.0.borrow_mut().registers[0] = status;
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.0.borrow().transfers.clone()
    }

    /// `(register, value)` for every single-register write, in order.
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.0
            .borrow()
            .transfers
            .iter()
            .filter(|t| t.bytes.len() == 2)
            .map(|t| (t.bytes[0], t.bytes[1]))
            .collect()
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.0.borrow().registers[reg as usize]
    }

    pub fn register_file(&self) -> Vec<u8> {
        self.0.borrow().registers.clone()
    }
}

impl Write for MockSi5351 {
    type Error = MockError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), MockError> {
        let mut log = self.0.borrow_mut();
        log.transfers.push(Transfer {
            address,
            bytes: bytes.to_vec(),
        });
        if address != log.address {
            return Err(MockError::NoDevice(address));
        }

        let (&reg, data) = match bytes.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };
        if log.failing.contains(&reg) {
            return Err(MockError::Nack(reg));
        }
        for (offset, &byte) in data.iter().enumerate() {
            let ix = (reg as usize + offset) % 256;
            log.registers[ix] = byte;
        }
        Ok(())
    }
}

impl WriteRead for MockSi5351 {
    type Error = MockError;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), MockError> {
        let mut log = self.0.borrow_mut();
        log.transfers.push(Transfer {
            address,
            bytes: bytes.to_vec(),
        });
        if address != log.address {
            return Err(MockError::NoDevice(address));
        }

        let reg = bytes.first().copied().unwrap_or(0) as usize;
        for (offset, slot) in buffer.iter_mut().enumerate() {
            *slot = log.registers[(reg + offset) % 256];
        }
        Ok(())
    }
}
