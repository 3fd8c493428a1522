//! Log Replay
//!
//! Rebuilds a log file's index by scanning every record from offset 0.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, error};

use crate::error::{KaveError, Result};
use crate::record::{EntryType, RecordHeader, MAX_HEADER_SIZE, VERSION_1};

/// Result of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of records scanned
    pub records: u64,

    /// Records of type `Written`
    pub written: u64,

    /// Records of type `Tombstoned`
    pub tombstones: u64,

    /// Records still in the version 1 layout
    pub legacy_records: u64,

    /// Bytes consumed (equals the file length on success)
    pub bytes: u64,
}

/// Replay an open file into a key → offset map
///
/// Both written and tombstoned records install their own offset, so the
/// rebuilt map is exactly what the live write/delete path would hold.
/// Any undecodable or truncated record aborts the replay; there is no
/// partial recovery.
pub(crate) fn replay(file: &File, path: &Path) -> Result<(HashMap<Vec<u8>, u64>, ReplayStats)> {
    let file_len = file.metadata()?.len();

    let mut cursor = file;
    cursor.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(cursor);

    let mut index = HashMap::new();
    let mut stats = ReplayStats::default();
    let mut position = 0u64;

    while position < file_len {
        match replay_record(&mut reader, position, file_len) {
            Ok((key, header)) => {
                // Same key twice: the later record wins
                index.insert(key, position);

                stats.records += 1;
                match header.entry_type() {
                    EntryType::Written => stats.written += 1,
                    EntryType::Tombstoned => stats.tombstones += 1,
                }
                if header.version() == VERSION_1 {
                    stats.legacy_records += 1;
                }

                position += header.record_len();
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    offset = position,
                    error = %e,
                    "Log replay failed"
                );
                return Err(e);
            }
        }
    }

    stats.bytes = position;

    debug!(
        path = %path.display(),
        records = stats.records,
        keys = index.len(),
        tombstones = stats.tombstones,
        legacy = stats.legacy_records,
        "Log replayed"
    );

    Ok((index, stats))
}

/// Replay a file read-only and report what it contains
pub(crate) fn verify(path: &Path) -> Result<ReplayStats> {
    let file = File::open(path)?;
    let (_, stats) = replay(&file, path)?;
    Ok(stats)
}

/// Read one record's header and key, then skip its value
fn replay_record<R: Read + Seek>(
    reader: &mut BufReader<R>,
    position: u64,
    file_len: u64,
) -> Result<(Vec<u8>, RecordHeader)> {
    let mut header_buf = [0u8; MAX_HEADER_SIZE];

    // Version byte first; it decides how long the header is
    reader.read_exact(&mut header_buf[..1])?;
    let header_len = RecordHeader::header_len_for(header_buf[0])?;
    ensure_available(position, header_len as u64, file_len)?;

    reader.read_exact(&mut header_buf[1..header_len])?;
    let header = RecordHeader::decode(&header_buf[..header_len])?;
    ensure_available(position, header.record_len(), file_len)?;

    let mut key = vec![0u8; header.key_len()];
    reader.read_exact(&mut key)?;
    reader.seek_relative(header.value_len() as i64)?;

    Ok((key, header))
}

fn ensure_available(position: u64, needed: u64, file_len: u64) -> Result<()> {
    let available = file_len - position;
    if needed > available {
        return Err(KaveError::TruncatedRecord {
            offset: position,
            expected: needed,
            available,
        });
    }
    Ok(())
}
