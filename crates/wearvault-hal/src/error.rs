//! Hardware abstraction layer error types

use thiserror::Error;

/// Hardware abstraction layer errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Byte address outside the NVM address space
    #[error("NVM address {address} out of range (size {size})")]
    AddressOutOfRange {
        /// Offending byte address
        address: u16,
        /// Total NVM size in bytes
        size: u16,
    },
}

impl HalError {
    /// Create an out-of-range address error
    pub fn address_out_of_range(address: u16, size: u16) -> Self {
        HalError::AddressOutOfRange { address, size }
    }
}
