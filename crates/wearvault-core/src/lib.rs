//! wearvault core storage logic
//!
//! Hardware-independent implementation of wear-levelled record
//! persistence for EEPROM-class NVM. One logical record occupies one or
//! more physical slots; wear-levelled units advance a bit-programmed
//! rolling counter across slots so that `R` logical writes cost each
//! slot a single erase cycle. Every slot carries a keyed CRC, torn
//! writes and garbled counters are detected and recovered, and a
//! registry maps application keys to records with schema-version
//! fingerprinting and deferred commits.
//!
//! The crate is generic over the [`wearvault_hal`] traits; tests run
//! against the mock NVM and clock.

pub mod attributor;
pub mod committer;
pub mod crc;
pub mod error;
pub mod record;
pub mod registry;
pub mod unit;

pub use attributor::{Attributor, Partition};
pub use committer::CommitScheduler;
pub use error::StorageError;
pub use record::{CommitPolicy, DataRecord, Record};
pub use registry::{version_fingerprint, Registry, CONTROL_SIZE, MAX_RECORD_SIZE};
pub use unit::{CounterWidth, PlainUnit, UnitIo, WearLevelUnit, MAX_ROTATIONS, MIN_ROTATIONS};
