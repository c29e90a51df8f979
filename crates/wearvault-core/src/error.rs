//! Error types for wearvault storage logic

use thiserror::Error;
use wearvault_hal::HalError;

/// Storage layer errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Hardware abstraction layer error
    #[error("NVM error: {0}")]
    Nvm(#[from] HalError),

    /// Integrity check failed on read; the output buffer holds the raw
    /// bytes but must be treated as invalid
    #[error("CRC mismatch")]
    CrcMismatch,

    /// Rotation count outside the supported range
    #[error("invalid rotation count {0} (supported range 2..=65)")]
    InvalidRotation(u8),

    /// Caller buffer length does not match the unit's data size
    #[error("buffer length {actual} does not match unit data size {expected}")]
    LengthMismatch {
        /// Unit data size in bytes
        expected: usize,
        /// Supplied buffer length
        actual: usize,
    },

    /// Record data size exceeds the registry bound
    #[error("record size {size} exceeds maximum {max}")]
    RecordTooLarge {
        /// Declared record size
        size: usize,
        /// Largest supported record size
        max: usize,
    },

    /// Registry record table is full
    #[error("registry full ({capacity} records)")]
    RegistryFull {
        /// Compile-time record capacity
        capacity: usize,
    },

    /// A record with this key is already registered
    #[error("duplicate record key {0:#010X}")]
    DuplicateKey(u32),

    /// No record with this key is registered
    #[error("unknown record key {0:#010X}")]
    KeyNotFound(u32),
}

impl StorageError {
    /// True for errors the registry recovers from by installing a
    /// record's default value
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, StorageError::CrcMismatch)
    }
}
