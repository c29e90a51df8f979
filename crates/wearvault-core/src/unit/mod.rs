//! Storage units: fixed-size records persisted with integrity checks
//!
//! Two variants share one slot format (`D` data bytes + 1 CRC byte):
//! [`PlainUnit`] persists a single slot, [`WearLevelUnit`] rotates a
//! record through several slots behind a bit-programmed rolling counter
//! to amplify write endurance.

pub mod counter;
pub mod plain;
pub mod wear_level;

pub use counter::{CounterWidth, MAX_ROTATIONS, MIN_ROTATIONS};
pub use plain::PlainUnit;
pub use wear_level::WearLevelUnit;

use crate::error::StorageError;
use wearvault_hal::NonVolatileMemory;

/// Common unit operations the record layer composes over
///
/// Object-safe so records can hold either unit variant behind one
/// generic parameter; the NVM handle is threaded through every call
/// rather than owned, keeping the address space a singleton.
pub trait UnitIo {
    /// Data size in bytes
    fn data_len(&self) -> u8;

    /// Read the current value into `out`, verifying its checksum
    fn read(&self, nvm: &mut dyn NonVolatileMemory, out: &mut [u8]) -> Result<(), StorageError>;

    /// Persist `data` with its checksum
    fn write(&mut self, nvm: &mut dyn NonVolatileMemory, data: &[u8]) -> Result<(), StorageError>;

    /// Erase the unit's whole NVM span back to 0xFF
    fn erase(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError>;
}
