//! Record capability set and the provided byte-image record
//!
//! A record is the registry-facing view of one persisted value: it
//! knows its key, its size, how to load itself from its unit, and how
//! to commit pending changes. Applications either use [`DataRecord`]
//! directly or implement [`Record`] for their own types.

use wearvault_hal::NonVolatileMemory;

use crate::error::StorageError;
use crate::unit::UnitIo;

/// When a record's `set` reaches the NVM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPolicy {
    /// `set` writes through to the unit immediately
    Immediate,
    /// `set` updates the in-memory copy and raises the dirty flag; the
    /// commit scheduler performs the physical write later
    Deferred,
}

/// Capability set the registry requires of every record
pub trait Record {
    /// Application key, unique within a registry
    fn key(&self) -> u32;

    /// Data size in bytes, at most 127
    fn size(&self) -> u8;

    /// Load the persisted value; on integrity failure install the
    /// default value and commit it
    fn load(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError>;

    /// Read the persisted value into `out`, verifying its checksum
    fn get(&self, nvm: &mut dyn NonVolatileMemory, out: &mut [u8]) -> Result<(), StorageError>;

    /// Accept a new value, persisting per the record's commit policy
    fn set(&mut self, nvm: &mut dyn NonVolatileMemory, data: &[u8]) -> Result<(), StorageError>;

    /// True when an accepted value has not reached the NVM yet
    fn needs_commit(&self) -> bool;

    /// Persist the in-memory value and clear the dirty flag
    fn commit(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError>;

    /// Erase the record's NVM span, forcing the next `load` onto the
    /// default-value path
    fn invalidate(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError>;
}

/// Fixed-size byte-image record over a storage unit
///
/// Holds the working copy and the type-provided default in memory. The
/// commit policy selects between write-through and deferred-commit
/// behaviour, so one type serves both synchronous and asynchronous
/// records.
pub struct DataRecord<U, const D: usize> {
    key: u32,
    unit: U,
    value: [u8; D],
    default: [u8; D],
    policy: CommitPolicy,
    dirty: bool,
}

impl<U: UnitIo, const D: usize> DataRecord<U, D> {
    /// Create a record for `key` over `unit`, seeded with `default`
    ///
    /// The unit's data size must equal `D`.
    pub fn new(key: u32, unit: U, default: [u8; D], policy: CommitPolicy) -> Self {
        debug_assert_eq!(unit.data_len() as usize, D);
        Self {
            key,
            unit,
            value: default,
            default,
            policy,
            dirty: false,
        }
    }

    /// Current in-memory copy of the value
    ///
    /// May be ahead of the NVM for a deferred record with a pending
    /// commit.
    pub fn value(&self) -> &[u8; D] {
        &self.value
    }
}

impl<U: UnitIo, const D: usize> Record for DataRecord<U, D> {
    fn key(&self) -> u32 {
        self.key
    }

    fn size(&self) -> u8 {
        D as u8
    }

    fn load(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        let mut buffer = [0u8; D];
        match self.unit.read(nvm, &mut buffer) {
            Ok(()) => {
                self.value = buffer;
            }
            Err(error) if error.is_integrity_failure() => {
                // Nothing usable in storage: persist the default so the
                // next boot reads cleanly.
                log::info!(
                    "record {:#010X}: no valid stored value, committing default",
                    self.key
                );
                self.value = self.default;
                self.unit.write(nvm, &self.default)?;
            }
            Err(error) => return Err(error),
        }
        self.dirty = false;
        Ok(())
    }

    fn get(&self, nvm: &mut dyn NonVolatileMemory, out: &mut [u8]) -> Result<(), StorageError> {
        self.unit.read(nvm, out)
    }

    fn set(&mut self, nvm: &mut dyn NonVolatileMemory, data: &[u8]) -> Result<(), StorageError> {
        if data.len() != D {
            return Err(StorageError::LengthMismatch {
                expected: D,
                actual: data.len(),
            });
        }
        self.value.copy_from_slice(data);
        match self.policy {
            CommitPolicy::Immediate => self.unit.write(nvm, &self.value),
            CommitPolicy::Deferred => {
                self.dirty = true;
                Ok(())
            }
        }
    }

    fn needs_commit(&self) -> bool {
        self.dirty
    }

    fn commit(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        self.dirty = false;
        self.unit.write(nvm, &self.value)
    }

    fn invalidate(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        self.unit.erase(nvm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::PlainUnit;
    use wearvault_hal::MockNvm;

    fn record(policy: CommitPolicy) -> DataRecord<PlainUnit, 2> {
        DataRecord::new(0xCAFE, PlainUnit::new(0, 2, 3), [0x10, 0x20], policy)
    }

    #[test]
    fn load_from_fresh_memory_commits_default() {
        let mut nvm = MockNvm::new(32);
        let mut rec = record(CommitPolicy::Immediate);

        rec.load(&mut nvm).unwrap();

        assert_eq!(rec.value(), &[0x10, 0x20]);
        let mut out = [0u8; 2];
        rec.get(&mut nvm, &mut out).unwrap();
        assert_eq!(out, [0x10, 0x20]);
    }

    #[test]
    fn load_prefers_persisted_value() {
        let mut nvm = MockNvm::new(32);
        let mut rec = record(CommitPolicy::Immediate);
        rec.set(&mut nvm, &[0xAB, 0xCD]).unwrap();

        let mut rec = record(CommitPolicy::Immediate);
        rec.load(&mut nvm).unwrap();
        assert_eq!(rec.value(), &[0xAB, 0xCD]);
    }

    #[test]
    fn immediate_set_writes_through() {
        let mut nvm = MockNvm::new(32);
        let mut rec = record(CommitPolicy::Immediate);

        rec.set(&mut nvm, &[0x01, 0x02]).unwrap();

        assert!(!rec.needs_commit());
        let mut out = [0u8; 2];
        rec.get(&mut nvm, &mut out).unwrap();
        assert_eq!(out, [0x01, 0x02]);
    }

    #[test]
    fn deferred_set_waits_for_commit() {
        let mut nvm = MockNvm::new(32);
        let mut rec = record(CommitPolicy::Deferred);
        rec.load(&mut nvm).unwrap();

        rec.set(&mut nvm, &[0x01, 0x02]).unwrap();
        assert!(rec.needs_commit());

        // The NVM still holds the default until commit.
        let mut out = [0u8; 2];
        rec.get(&mut nvm, &mut out).unwrap();
        assert_eq!(out, [0x10, 0x20]);

        rec.commit(&mut nvm).unwrap();
        assert!(!rec.needs_commit());
        rec.get(&mut nvm, &mut out).unwrap();
        assert_eq!(out, [0x01, 0x02]);
    }

    #[test]
    fn invalidate_forces_default_path() {
        let mut nvm = MockNvm::new(32);
        let mut rec = record(CommitPolicy::Immediate);
        rec.set(&mut nvm, &[0x01, 0x02]).unwrap();

        rec.invalidate(&mut nvm).unwrap();
        rec.load(&mut nvm).unwrap();
        assert_eq!(rec.value(), &[0x10, 0x20]);
    }

    #[test]
    fn set_rejects_wrong_length() {
        let mut nvm = MockNvm::new(32);
        let mut rec = record(CommitPolicy::Immediate);
        assert!(rec.set(&mut nvm, &[0x01]).is_err());
    }
}
