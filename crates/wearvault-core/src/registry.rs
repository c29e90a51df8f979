//! Record registry: keyed dispatch, schema fingerprinting, bring-up
//!
//! The registry owns the ordered record table. `setup` folds the
//! registered keys into an 8-bit version fingerprint and compares it
//! with the one persisted in the control prefix; a mismatch means the
//! record schema drifted between firmware revisions, and every stored
//! value is invalidated so the records come up on their defaults.

use heapless::Vec;
use wearvault_hal::NonVolatileMemory;

use crate::error::StorageError;
use crate::record::Record;
use crate::unit::PlainUnit;

/// Largest record data size the registry accepts
pub const MAX_RECORD_SIZE: usize = 127;

/// Bytes reserved below the attributed partitions for the control
/// prefix (version fingerprint + CRC)
pub const CONTROL_SIZE: u16 = 2;

/// CRC key for the control prefix; not application-facing
const CONTROL_KEY: u32 = 0x5745_4152;

/// Fold a base version code and record keys into the 8-bit version
/// fingerprint
///
/// Any change to the key set (or the base code) moves the fingerprint,
/// which is what invalidates persisted data across schema drift.
pub fn version_fingerprint(base_version: u8, keys: impl IntoIterator<Item = u32>) -> u8 {
    let mut acc = u32::from(base_version);
    for key in keys {
        acc = acc.wrapping_add(key).rotate_left(5) ^ key;
    }
    (acc ^ (acc >> 8) ^ (acc >> 16) ^ (acc >> 24)) as u8
}

/// Registry over at most `MAX` records
///
/// Records are enumerated in insertion order; a record's position is
/// its partition index. All NVM traffic goes through the handle passed
/// into each operation.
pub struct Registry<'a, const MAX: usize> {
    records: Vec<&'a mut dyn Record, MAX>,
    base_version: u8,
    control: PlainUnit,
}

impl<'a, const MAX: usize> Registry<'a, MAX> {
    /// Create a registry with its control prefix at NVM address 0
    pub fn new(base_version: u8) -> Self {
        Self::with_control_base(base_version, 0)
    }

    /// Create a registry with the control prefix at `control_base`
    pub fn with_control_base(base_version: u8, control_base: u16) -> Self {
        Self {
            records: Vec::new(),
            base_version,
            control: PlainUnit::new(control_base, 1, CONTROL_KEY),
        }
    }

    /// Number of registered records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are registered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Version fingerprint over the current record set
    pub fn fingerprint(&self) -> u8 {
        version_fingerprint(self.base_version, self.records.iter().map(|r| r.key()))
    }

    fn find(&self, key: u32) -> Option<usize> {
        self.records.iter().position(|record| record.key() == key)
    }

    /// Register a record; its partition index is its insertion order
    pub fn add(&mut self, record: &'a mut dyn Record) -> Result<usize, StorageError> {
        if record.size() as usize > MAX_RECORD_SIZE {
            return Err(StorageError::RecordTooLarge {
                size: record.size() as usize,
                max: MAX_RECORD_SIZE,
            });
        }
        if self.find(record.key()).is_some() {
            return Err(StorageError::DuplicateKey(record.key()));
        }
        let index = self.records.len();
        self.records
            .push(record)
            .map_err(|_| StorageError::RegistryFull { capacity: MAX })?;
        Ok(index)
    }

    /// Bring the registry up after every record has been added
    ///
    /// Compares the stored version fingerprint with the computed one;
    /// on mismatch (or an unreadable control prefix) every record is
    /// invalidated and the new fingerprint stored. Then every record
    /// loads, falling back to its default where nothing valid is
    /// persisted.
    pub fn setup(&mut self, nvm: &mut dyn NonVolatileMemory) -> Result<(), StorageError> {
        let version = self.fingerprint();
        let mut stored = [0u8; 1];
        let drifted = match self.control.read(nvm, &mut stored) {
            Ok(()) => stored[0] != version,
            Err(error) if error.is_integrity_failure() => true,
            Err(error) => return Err(error),
        };

        if drifted {
            log::warn!(
                "stored version does not match {version:#04X}, invalidating {} records",
                self.records.len()
            );
            for record in &mut self.records {
                record.invalidate(nvm)?;
            }
            self.control.write(nvm, &[version])?;
        }

        for record in &mut self.records {
            record.load(nvm)?;
        }
        log::info!(
            "registry up: {} records, version {version:#04X}",
            self.records.len()
        );
        Ok(())
    }

    /// Read the record keyed `key` into `out`
    pub fn get(
        &self,
        nvm: &mut dyn NonVolatileMemory,
        key: u32,
        out: &mut [u8],
    ) -> Result<(), StorageError> {
        let index = self.find(key).ok_or(StorageError::KeyNotFound(key))?;
        self.records[index].get(nvm, out)
    }

    /// Hand `data` to the record keyed `key`
    ///
    /// Whether the NVM is written now or at the next commit tick is the
    /// record's commit policy.
    pub fn set(
        &mut self,
        nvm: &mut dyn NonVolatileMemory,
        key: u32,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let index = self.find(key).ok_or(StorageError::KeyNotFound(key))?;
        self.records[index].set(nvm, data)
    }

    /// Commit the first record with a pending value, in insertion order
    ///
    /// Returns whether such a record was found; at most one physical
    /// write happens per call.
    pub fn commit_next_pending(
        &mut self,
        nvm: &mut dyn NonVolatileMemory,
    ) -> Result<bool, StorageError> {
        for record in &mut self.records {
            if record.needs_commit() {
                record.commit(nvm)?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
