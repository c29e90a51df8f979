//! Hardware abstraction traits for wearvault
//!
//! These traits define the interface between the storage logic and
//! platform-specific hardware implementations.

use crate::error::HalError;

/// Byte-addressable non-volatile memory
///
/// Models an EEPROM-class medium with two distinct write primitives:
/// a full erase+write of a byte (endurance-costly) and a bit-clearing
/// program that can only turn 1-bits into 0-bits (essentially free of
/// endurance cost). A dedicated erase returns a byte to 0xFF.
///
/// Ownership of the whole address space is singleton; callers partition
/// it among themselves before use.
pub trait NonVolatileMemory {
    /// Total bytes in the NVM address space
    fn size(&self) -> u16;

    /// Read the byte at `address`
    fn read_byte(&mut self, address: u16) -> Result<u8, HalError>;

    /// Erase+write the byte at `address`, consuming one erase cycle
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), HalError>;

    /// Erase the byte at `address` back to 0xFF, consuming one erase cycle
    fn erase_byte(&mut self, address: u16) -> Result<(), HalError>;

    /// AND `mask` into the byte at `address` without an erase cycle
    ///
    /// Only 1→0 bit transitions are possible; bits that are already zero
    /// stay zero regardless of the mask.
    fn program_zero_bits(&mut self, address: u16, mask: u8) -> Result<(), HalError>;
}

/// Monotonic time source
///
/// Must never go backwards; the commit scheduler compares deadlines
/// against it.
pub trait TimeProvider {
    /// Current system time in milliseconds since boot
    fn now_ms(&self) -> u64;
}
