//! Record headers
//!
//! One variant per format version. The version byte is inspected exactly
//! once, in `decode`; everything else asks the variant.

use crate::error::{KaveError, Result};

use super::{check_lengths, EntryType, VERSION_1, VERSION_2};

/// Header size of a version 1 record
pub const V1_HEADER_SIZE: usize = 6;

/// Header size of a version 2 record
pub const V2_HEADER_SIZE: usize = 7;

/// Largest header of any known version
pub const MAX_HEADER_SIZE: usize = V2_HEADER_SIZE;

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordHeader {
    /// `[vsn][key_len][value_len: u32 LE]`
    V1 { key_len: u8, value_len: u32 },

    /// `[vsn][key_len][value_len: u32 LE][entry_type]`
    V2 {
        key_len: u8,
        value_len: u32,
        entry_type: EntryType,
    },
}

impl RecordHeader {
    /// Build a current-version header, enforcing the length limits
    pub fn new(entry_type: EntryType, key_len: usize, value_len: usize) -> Result<Self> {
        check_lengths(key_len, value_len)?;

        Ok(RecordHeader::V2 {
            key_len: key_len as u8,
            value_len: value_len as u32,
            entry_type,
        })
    }

    /// Header length for a given version byte
    pub fn header_len_for(version: u8) -> Result<usize> {
        match version {
            VERSION_1 => Ok(V1_HEADER_SIZE),
            VERSION_2 => Ok(V2_HEADER_SIZE),
            other => Err(KaveError::UnrecognisedVersion(other)),
        }
    }

    /// Decode a header from the start of `bytes`
    ///
    /// `bytes` must hold at least the full header for the version found in
    /// its first byte; anything after the header is ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let version = match bytes.first() {
            Some(&v) => v,
            None => return Err(truncated(1, 0)),
        };

        let header_len = Self::header_len_for(version)?;
        if bytes.len() < header_len {
            return Err(truncated(header_len, bytes.len()));
        }

        match version {
            VERSION_1 => Ok(decode_v1(&bytes[..V1_HEADER_SIZE])),
            _ => decode_v2(&bytes[..V2_HEADER_SIZE]),
        }
    }

    /// Append the encoded header to `buf`
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match *self {
            RecordHeader::V1 { key_len, value_len } => {
                buf.push(VERSION_1);
                buf.push(key_len);
                buf.extend_from_slice(&value_len.to_le_bytes());
            }
            RecordHeader::V2 {
                key_len,
                value_len,
                entry_type,
            } => {
                buf.push(VERSION_2);
                buf.push(key_len);
                buf.extend_from_slice(&value_len.to_le_bytes());
                buf.push(entry_type as u8);
            }
        }
    }

    pub fn version(&self) -> u8 {
        match self {
            RecordHeader::V1 { .. } => VERSION_1,
            RecordHeader::V2 { .. } => VERSION_2,
        }
    }

    pub fn header_len(&self) -> usize {
        match self {
            RecordHeader::V1 { .. } => V1_HEADER_SIZE,
            RecordHeader::V2 { .. } => V2_HEADER_SIZE,
        }
    }

    pub fn key_len(&self) -> usize {
        match *self {
            RecordHeader::V1 { key_len, .. } | RecordHeader::V2 { key_len, .. } => key_len as usize,
        }
    }

    pub fn value_len(&self) -> usize {
        match *self {
            RecordHeader::V1 { value_len, .. } | RecordHeader::V2 { value_len, .. } => {
                value_len as usize
            }
        }
    }

    /// Version 1 predates deletes, so every v1 record is `Written`
    pub fn entry_type(&self) -> EntryType {
        match *self {
            RecordHeader::V1 { .. } => EntryType::Written,
            RecordHeader::V2 { entry_type, .. } => entry_type,
        }
    }

    /// Total bytes occupied by the record this header introduces
    pub fn record_len(&self) -> u64 {
        (self.header_len() + self.key_len() + self.value_len()) as u64
    }

    /// Offset of the value bytes, relative to the record start
    pub fn value_offset(&self) -> u64 {
        (self.header_len() + self.key_len()) as u64
    }
}

fn decode_v1(bytes: &[u8]) -> RecordHeader {
    RecordHeader::V1 {
        key_len: bytes[1],
        value_len: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
    }
}

fn decode_v2(bytes: &[u8]) -> Result<RecordHeader> {
    Ok(RecordHeader::V2 {
        key_len: bytes[1],
        value_len: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        entry_type: EntryType::try_from(bytes[6])?,
    })
}

fn truncated(expected: usize, available: usize) -> KaveError {
    KaveError::TruncatedRecord {
        offset: 0,
        expected: expected as u64,
        available: available as u64,
    }
}
