//! Wear-levelled CRC-checked storage unit
//!
//! One logical record rotates through `R` physical slots; the rolling
//! counter at the head of the unit names the slot holding the current
//! value. Advancing the counter only clears bits, so `R − 1` out of
//! every `R` logical writes cost the counter nothing; the wrap back to
//! slot 0 pays a single erase. Each slot's CRC is salted with the slot's
//! counter value, so a slot image relocated to a different rotation
//! position never validates.
//!
//! NVM layout: `C` counter bytes, then `R` slots of `D + 1` bytes each
//! (data followed by CRC).

use wearvault_hal::NonVolatileMemory;

use crate::crc::crc8;
use crate::error::StorageError;
use crate::unit::counter::{self, CounterWidth};
use crate::unit::UnitIo;

/// Wear-levelled storage unit
///
/// Construction validates the persisted counter and repairs it in place
/// when a power loss has garbled it; after [`WearLevelUnit::open`]
/// returns, the counter region always holds a well-formed pattern.
#[derive(Debug, Clone)]
pub struct WearLevelUnit {
    base: u16,
    data_len: u8,
    rotations: u8,
    width: CounterWidth,
    key: u32,
}

impl WearLevelUnit {
    /// NVM bytes occupied by a unit of `data_len` data bytes rotating
    /// through `rotations` slots, `None` when the rotation count is
    /// outside the supported range
    ///
    /// `const`-evaluable for sizing partition tables.
    pub const fn footprint(data_len: u8, rotations: u8) -> Option<u16> {
        match CounterWidth::for_rotations(rotations) {
            Some(width) => Some(width.bytes() + rotations as u16 * (data_len as u16 + 1)),
            None => None,
        }
    }

    /// Open the unit at `base`, validating and if necessary repairing
    /// the persisted counter
    ///
    /// Repair (erasing the counter region back to all-ones) is the only
    /// erase construction ever pays, and only after observed corruption.
    pub fn open(
        nvm: &mut dyn NonVolatileMemory,
        base: u16,
        data_len: u8,
        rotations: u8,
        key: u32,
    ) -> Result<Self, StorageError> {
        let width = CounterWidth::for_rotations(rotations)
            .ok_or(StorageError::InvalidRotation(rotations))?;
        let unit = Self {
            base,
            data_len,
            rotations,
            width,
            key,
        };

        match unit.raw_counter(nvm)? {
            Some(value) if value <= rotations => {}
            observed => {
                log::warn!(
                    "unit at {base:#06X}: counter {observed:?} invalid, resetting to slot 0"
                );
                unit.reset_counter(nvm)?;
            }
        }

        Ok(unit)
    }

    /// Base address of the unit's NVM range
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Data size in bytes
    pub fn data_len(&self) -> u8 {
        self.data_len
    }

    /// Number of physical slots the unit rotates through
    pub fn rotations(&self) -> u8 {
        self.rotations
    }

    /// NVM bytes occupied by this unit
    pub fn size(&self) -> u16 {
        self.width.bytes() + self.rotations as u16 * self.stride()
    }

    fn stride(&self) -> u16 {
        self.data_len as u16 + 1
    }

    fn slot_address(&self, slot: u8) -> u16 {
        self.base + self.width.bytes() + slot as u16 * self.stride()
    }

    fn check_len(&self, len: usize) -> Result<(), StorageError> {
        if len != self.data_len as usize {
            return Err(StorageError::LengthMismatch {
                expected: self.data_len as usize,
                actual: len,
            });
        }
        Ok(())
    }

    /// Decode the raw counter pattern, `None` when garbled
    fn raw_counter(&self, nvm: &mut dyn NonVolatileMemory) -> Result<Option<u8>, StorageError> {
        let mut region = [0u8; 8];
        let region = &mut region[..self.width.bytes() as usize];
        for (index, byte) in region.iter_mut().enumerate() {
            *byte = nvm.read_byte(self.base + index as u16)?;
        }
        Ok(counter::decode(region))
    }

    /// Current slot index, clamped to the rotation range
    ///
    /// A garbled pattern reads as slot 0; the slot CRC then reports the
    /// damage. Post-construction the pattern is valid by invariant.
    fn current_slot(&self, nvm: &mut dyn NonVolatileMemory) -> Result<u8, StorageError> {
        let raw = self.raw_counter(nvm)?.unwrap_or(0);
        Ok(raw.min(self.rotations - 1))
    }

    /// Erase the counter region back to all-ones (counter value 0)
    fn reset_counter(&self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        for index in 0..self.width.bytes() {
            nvm.erase_byte(self.base + index)?;
        }
        Ok(())
    }

    /// Advance the counter, wrapping with an erase when the rotation is
    /// exhausted; returns the new counter value
    fn increment_counter(&self, nvm: &mut dyn NonVolatileMemory) -> Result<u8, StorageError> {
        let current = self.current_slot(nvm)?;
        if current + 1 >= self.rotations {
            self.reset_counter(nvm)?;
            log::debug!("unit at {:#06X}: rotation wrapped", self.base);
            return Ok(0);
        }

        let next = current + 1;
        let mut pattern = [0u8; 8];
        let pattern = &mut pattern[..self.width.bytes() as usize];
        counter::encode(next, pattern);
        // Only touch bytes whose pattern actually moved; programming is
        // cheap but not free on every medium.
        for (index, &target) in pattern.iter().enumerate() {
            let address = self.base + index as u16;
            if nvm.read_byte(address)? != target {
                nvm.program_zero_bits(address, target)?;
            }
        }
        Ok(next)
    }

    /// Read the current slot into `out` and verify its checksum
    ///
    /// On `CrcMismatch` the buffer holds the raw slot bytes but must be
    /// treated as invalid.
    pub fn read(&self, nvm: &mut dyn NonVolatileMemory, out: &mut [u8]) -> Result<(), StorageError> {
        self.check_len(out.len())?;
        let slot = self.current_slot(nvm)?;
        let address = self.slot_address(slot);
        for (offset, byte) in out.iter_mut().enumerate() {
            *byte = nvm.read_byte(address + offset as u16)?;
        }
        let stored = nvm.read_byte(address + self.data_len as u16)?;
        if crc8(out, self.key, slot) == stored {
            Ok(())
        } else {
            Err(StorageError::CrcMismatch)
        }
    }

    /// Advance the rotation and write `data` into the new slot
    ///
    /// Ordering within the write: counter first, then data bytes, CRC
    /// byte last. A crash before the CRC lands leaves the new slot
    /// detectably bad while earlier slots are untouched.
    pub fn write(&mut self, nvm: &mut dyn NonVolatileMemory, data: &[u8]) -> Result<(), StorageError> {
        self.check_len(data.len())?;
        let slot = self.increment_counter(nvm)?;
        let address = self.slot_address(slot);
        for (offset, &byte) in data.iter().enumerate() {
            nvm.write_byte(address + offset as u16, byte)?;
        }
        nvm.write_byte(address + self.data_len as u16, crc8(data, self.key, slot))?;
        log::debug!("unit at {:#06X}: wrote slot {slot}", self.base);
        Ok(())
    }

    /// Erase the whole unit span back to 0xFF
    ///
    /// Leaves the counter at 0 and every slot CRC-invalid.
    pub fn erase(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        let end = self.base + self.size();
        for address in self.base..end {
            nvm.erase_byte(address)?;
        }
        Ok(())
    }
}

impl UnitIo for WearLevelUnit {
    fn data_len(&self) -> u8 {
        self.data_len
    }

    fn read(&self, nvm: &mut dyn NonVolatileMemory, out: &mut [u8]) -> Result<(), StorageError> {
        WearLevelUnit::read(self, nvm, out)
    }

    fn write(&mut self, nvm: &mut dyn NonVolatileMemory, data: &[u8]) -> Result<(), StorageError> {
        WearLevelUnit::write(self, nvm, data)
    }

    fn erase(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        WearLevelUnit::erase(self, nvm)
    }
}
