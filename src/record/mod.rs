//! Record Codec
//!
//! Maps a single log entry to and from its on-disk bytes.
//!
//! ## Responsibilities
//! - Validate key/value lengths before anything touches a file
//! - Encode new records (always the current version)
//! - Decode headers of every version ever written, so old logs still replay
//!
//! ## Record Format (version 2)
//! ```text
//! ┌─────────┬──────────┬───────────────┬──────────┬───────────┬─────────────┐
//! │ Vsn (1) │ KLen (1) │ VLen (4, LE)  │ Type (1) │ Key bytes │ Value bytes │
//! └─────────┴──────────┴───────────────┴──────────┴───────────┴─────────────┘
//! ```
//! Version 1 records have the same layout without the type byte (6-byte
//! header) and are always `Written`. There is no file header, no checksum
//! and no end marker: records are simply concatenated until EOF.

mod header;

pub use header::{RecordHeader, MAX_HEADER_SIZE, V1_HEADER_SIZE, V2_HEADER_SIZE};

use crate::error::{KaveError, Result};

/// Format version of records written before tombstones existed
pub const VERSION_1: u8 = 1;

/// Format version with an explicit entry type byte
pub const VERSION_2: u8 = 2;

/// Version used for every record this crate writes
pub const CURRENT_VERSION: u8 = VERSION_2;

/// Longest key a record can carry (key length is a single byte)
pub const MAX_KEY_LENGTH: usize = u8::MAX as usize;

/// Longest value a record can carry (2^31 - 1)
pub const MAX_VALUE_LENGTH: usize = i32::MAX as usize;

/// Kind of log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// The key was set to the record's value
    Written = 0,

    /// The key was deleted; the record carries no value
    Tombstoned = 1,
}

impl TryFrom<u8> for EntryType {
    type Error = KaveError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(EntryType::Written),
            1 => Ok(EntryType::Tombstoned),
            other => Err(KaveError::UnrecognisedEntryType(other)),
        }
    }
}

/// Check key and value lengths against the format limits
pub fn validate(key: &[u8], value: &[u8]) -> Result<()> {
    check_lengths(key.len(), value.len())
}

pub(crate) fn check_lengths(key_len: usize, value_len: usize) -> Result<()> {
    if key_len > MAX_KEY_LENGTH {
        return Err(KaveError::KeyTooLong {
            len: key_len,
            max: MAX_KEY_LENGTH,
        });
    }
    if value_len > MAX_VALUE_LENGTH {
        return Err(KaveError::ValueTooLong {
            len: value_len,
            max: MAX_VALUE_LENGTH,
        });
    }
    Ok(())
}

/// Encode a `Written` record for `key` → `value`
pub fn encode_write(key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    encode_record(EntryType::Written, key, value)
}

/// Encode a `Tombstoned` record for `key` (zero-length value)
pub fn encode_tombstone(key: &[u8]) -> Result<Vec<u8>> {
    encode_record(EntryType::Tombstoned, key, &[])
}

/// Encode a complete record: header, key bytes, value bytes
///
/// Fails with `KeyTooLong` / `ValueTooLong` without producing any bytes.
pub fn encode_record(entry_type: EntryType, key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    let header = RecordHeader::new(entry_type, key.len(), value.len())?;

    let mut buf = Vec::with_capacity(header.record_len() as usize);
    header.encode_into(&mut buf);
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);

    Ok(buf)
}
