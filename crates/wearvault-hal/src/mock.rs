//! Mock NVM and clock implementations for testing without hardware

use crate::error::HalError;
use crate::traits::{NonVolatileMemory, TimeProvider};
use core::ops::Range;

/// In-memory NVM simulator with per-byte operation accounting
///
/// Fresh memory reads as all 0xFF, like an erased EEPROM. Every byte
/// tracks how many erase+write cycles, erase-only cycles, and zero-bit
/// programming operations it has seen, so tests can assert endurance
/// properties instead of trusting them.
pub struct MockNvm {
    bytes: Vec<u8>,
    write_counts: Vec<u32>,
    erase_counts: Vec<u32>,
    program_counts: Vec<u32>,
}

impl MockNvm {
    /// Create a fresh (fully erased) NVM of `size` bytes
    pub fn new(size: u16) -> Self {
        Self {
            bytes: vec![0xFF; size as usize],
            write_counts: vec![0; size as usize],
            erase_counts: vec![0; size as usize],
            program_counts: vec![0; size as usize],
        }
    }

    fn check_bounds(&self, address: u16) -> Result<usize, HalError> {
        let index = address as usize;
        if index >= self.bytes.len() {
            return Err(HalError::address_out_of_range(address, self.size()));
        }
        Ok(index)
    }

    /// Overwrite a byte directly, bypassing the primitives and their
    /// accounting. Corruption injection for tests.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.bytes[address as usize] = value;
    }

    /// Read a byte directly without going through the trait
    pub fn peek(&self, address: u16) -> u8 {
        self.bytes[address as usize]
    }

    /// Return the whole memory to the erased state and zero all counters
    pub fn erase_all(&mut self) {
        self.bytes.fill(0xFF);
        self.write_counts.fill(0);
        self.erase_counts.fill(0);
        self.program_counts.fill(0);
    }

    /// Erase+write cycles seen by the byte at `address`
    pub fn write_count(&self, address: u16) -> u32 {
        self.write_counts[address as usize]
    }

    /// Erase-only cycles seen by the byte at `address`
    pub fn erase_count(&self, address: u16) -> u32 {
        self.erase_counts[address as usize]
    }

    /// Zero-bit programming operations seen by the byte at `address`
    pub fn program_count(&self, address: u16) -> u32 {
        self.program_counts[address as usize]
    }

    /// Total erase+write cycles across an address range
    pub fn writes_in(&self, range: Range<u16>) -> u32 {
        range.map(|a| self.write_counts[a as usize]).sum()
    }

    /// Total erase-only cycles across an address range
    pub fn erases_in(&self, range: Range<u16>) -> u32 {
        range.map(|a| self.erase_counts[a as usize]).sum()
    }

    /// Total zero-bit programming operations across an address range
    pub fn programs_in(&self, range: Range<u16>) -> u32 {
        range.map(|a| self.program_counts[a as usize]).sum()
    }
}

impl NonVolatileMemory for MockNvm {
    fn size(&self) -> u16 {
        self.bytes.len() as u16
    }

    fn read_byte(&mut self, address: u16) -> Result<u8, HalError> {
        let index = self.check_bounds(address)?;
        Ok(self.bytes[index])
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), HalError> {
        let index = self.check_bounds(address)?;
        self.bytes[index] = value;
        self.write_counts[index] += 1;
        log::trace!("mock NVM write {address:#06X} <- {value:#04X}");
        Ok(())
    }

    fn erase_byte(&mut self, address: u16) -> Result<(), HalError> {
        let index = self.check_bounds(address)?;
        self.bytes[index] = 0xFF;
        self.erase_counts[index] += 1;
        log::trace!("mock NVM erase {address:#06X}");
        Ok(())
    }

    fn program_zero_bits(&mut self, address: u16, mask: u8) -> Result<(), HalError> {
        let index = self.check_bounds(address)?;
        self.bytes[index] &= mask;
        self.program_counts[index] += 1;
        log::trace!("mock NVM program {address:#06X} &= {mask:#04X}");
        Ok(())
    }
}

/// Manually advanced monotonic clock
#[derive(Debug, Default)]
pub struct MockClock {
    now_ms: u64,
}

impl MockClock {
    /// Create a clock starting at t=0
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `ms` milliseconds
    pub fn advance_ms(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    /// Jump the clock to an absolute time; must not move backwards
    pub fn set_ms(&mut self, now_ms: u64) {
        debug_assert!(now_ms >= self.now_ms);
        self.now_ms = now_ms;
    }
}

impl TimeProvider for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
