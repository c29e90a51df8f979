//! Single-slot CRC-checked storage unit

use wearvault_hal::NonVolatileMemory;

use crate::crc::crc8;
use crate::error::StorageError;
use crate::unit::UnitIo;

/// CRC-checked storage unit without wear levelling
///
/// Persists one fixed-size byte array at a fixed NVM range, followed by
/// a single checksum byte. The degenerate single-rotation case of the
/// wear-levelled unit: no counter region, salt fixed at zero. A crash
/// mid-write leaves no old copy behind; the next read reports the torn
/// state through the CRC and the caller falls back to its default
/// value.
#[derive(Debug, Clone)]
pub struct PlainUnit {
    base: u16,
    data_len: u8,
    key: u32,
}

impl PlainUnit {
    /// NVM bytes occupied by a plain unit of `data_len` data bytes
    pub const fn footprint(data_len: u8) -> u16 {
        data_len as u16 + 1
    }

    /// Describe a plain unit at `base` holding `data_len` bytes under `key`
    pub fn new(base: u16, data_len: u8, key: u32) -> Self {
        Self { base, data_len, key }
    }

    /// Base address of the unit's NVM range
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Data size in bytes
    pub fn data_len(&self) -> u8 {
        self.data_len
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

    /// Read the stored value into `out` and verify its checksum
    ///
    /// On `CrcMismatch` the buffer holds the raw bytes but must be
    /// treated as invalid.
    pub fn read(&self, nvm: &mut dyn NonVolatileMemory, out: &mut [u8]) -> Result<(), StorageError> {
        self.check_len(out.len())?;
        for (offset, slot) in out.iter_mut().enumerate() {
            *slot = nvm.read_byte(self.base + offset as u16)?;
        }
        let stored = nvm.read_byte(self.base + self.data_len as u16)?;
        if crc8(out, self.key, 0) == stored {
            Ok(())
        } else {
            Err(StorageError::CrcMismatch)
        }
    }

    /// Write `data` and its checksum
    ///
    /// The checksum byte is written last, so a crash mid-write is
    /// detectable by the next reader.
    pub fn write(&mut self, nvm: &mut dyn NonVolatileMemory, data: &[u8]) -> Result<(), StorageError> {
        self.check_len(data.len())?;
        for (offset, &byte) in data.iter().enumerate() {
            nvm.write_byte(self.base + offset as u16, byte)?;
        }
        nvm.write_byte(self.base + self.data_len as u16, crc8(data, self.key, 0))?;
        Ok(())
    }

    /// Erase the whole unit span back to 0xFF
    pub fn erase(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        let end = self.base + Self::footprint(self.data_len);
        for address in self.base..end {
            nvm.erase_byte(address)?;
        }
        Ok(())
    }
}

impl UnitIo for PlainUnit {
    fn data_len(&self) -> u8 {
        self.data_len
    }

    fn read(&self, nvm: &mut dyn NonVolatileMemory, out: &mut [u8]) -> Result<(), StorageError> {
        PlainUnit::read(self, nvm, out)
    }

    fn write(&mut self, nvm: &mut dyn NonVolatileMemory, data: &[u8]) -> Result<(), StorageError> {
        PlainUnit::write(self, nvm, data)
    }

    fn erase(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        PlainUnit::erase(self, nvm)
    }
}
