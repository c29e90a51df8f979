//! Keyed 8-bit checksum
//!
//! CRC-8/SMBus over the data bytes followed by the little-endian key
//! bytes and the salt byte. The key is a fixed per-unit
//! salt chosen by the application; changing it invalidates every record
//! previously persisted under it. The one-byte salt carries the rotation
//! counter in wear-levelled units so that identical payloads at
//! different slots produce distinct checksums.

use crc::{Crc, CRC_8_SMBUS};

const SMBUS: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Checksum `data` under `key` and `salt`
///
/// The algorithm is fixed for the lifetime of persisted data; records
/// written under a different key or salt fail the check.
pub fn crc8(data: &[u8], key: u32, salt: u8) -> u8 {
    let mut digest = SMBUS.digest();
    digest.update(data);
    digest.update(&key.to_le_bytes());
    digest.update(&[salt]);
    digest.finalize()
}
