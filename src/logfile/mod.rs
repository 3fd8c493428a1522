//! Log File Module
//!
//! One append-only file of records plus the in-memory index derived from it.
//!
//! ## Responsibilities
//! - Append records durably, one writer at a time
//! - Keep key → offset of the latest record per key
//! - Serve reads with positioned I/O, concurrently with appends
//! - Rebuild the index on open by replaying the file
//!
//! ## Lifecycle
//! ```text
//! Closed ──open()──▶ Open(replaying) ──replay ok──▶ Open(ready)
//!                          │
//!                          └──format / I/O error──▶ open fails
//! ```
//!
//! ## Concurrency Model
//! - `write_lock` guards "size → append → sync → index update". The offset of
//!   a record is the file size taken inside this lock.
//! - The index has its own RwLock, taken only for the map operation.
//! - The index only ever points at records whose append (and sync, when
//!   configured) already completed, so a reader can never see a torn record.

mod index;
mod pread;
mod replay;

pub use index::KeyIndex;
pub use replay::ReplayStats;

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::trace;

use crate::config::SyncStrategy;
use crate::error::Result;
use crate::record::{self, EntryType, RecordHeader, MAX_HEADER_SIZE};

/// Outcome of looking a key up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The latest record is a live value
    Found(Bytes),

    /// The latest record is a tombstone
    Deleted,

    /// No record for this key
    NotPresent,
}

impl Lookup {
    /// `Found` and `Deleted` settle a read; `NotPresent` means "ask someone older"
    pub fn is_definitive(&self) -> bool {
        !matches!(self, Lookup::NotPresent)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// The value, if live
    pub fn into_value(self) -> Option<Bytes> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Deleted | Lookup::NotPresent => None,
        }
    }
}

/// An append-only key-value log file
pub struct LogFile {
    /// Location on disk
    path: PathBuf,

    /// Opened read + append; appends always land at EOF
    file: File,

    /// Serializes appends (see module docs)
    write_lock: Mutex<()>,

    /// key → offset of the latest record for that key
    index: KeyIndex,

    sync_strategy: SyncStrategy,

    /// What the opening replay found
    replay_stats: ReplayStats,
}

impl LogFile {
    /// Open (creating if absent) a log file and replay it
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let (map, replay_stats) = replay::replay(&file, path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            write_lock: Mutex::new(()),
            index: KeyIndex::from_map(map),
            sync_strategy,
            replay_stats,
        })
    }

    /// Replay a log file without opening it for writes
    pub fn verify(path: &Path) -> Result<ReplayStats> {
        replay::verify(path)
    }

    /// Append a `Written` record and return its offset
    ///
    /// Length limits are checked before anything is written. If the append
    /// fails the index is left untouched.
    pub fn write(&self, key: &[u8], value: &[u8]) -> Result<u64> {
        let record = record::encode_write(key, value)?;
        let offset = self.append(key, &record)?;

        trace!(path = %self.path.display(), offset, len = record.len(), "Record written");
        Ok(offset)
    }

    /// Append a tombstone for `key` and return its offset
    ///
    /// The index keeps the key, pointing at the tombstone. Deleting a key
    /// that was never written still appends a tombstone.
    pub fn delete(&self, key: &[u8]) -> Result<u64> {
        let record = record::encode_tombstone(key)?;
        let offset = self.append(key, &record)?;

        trace!(path = %self.path.display(), offset, "Tombstone written");
        Ok(offset)
    }

    /// Look up the latest record for `key` in this file
    pub fn read(&self, key: &[u8]) -> Result<Lookup> {
        let offset = match self.index.get(key) {
            Some(offset) => offset,
            None => return Ok(Lookup::NotPresent),
        };

        let header = self.read_header_at(offset)?;
        match header.entry_type() {
            EntryType::Tombstoned => Ok(Lookup::Deleted),
            EntryType::Written => {
                let mut value = vec![0u8; header.value_len()];
                pread::read_exact_at(&self.file, &mut value, offset + header.value_offset())?;
                Ok(Lookup::Found(Bytes::from(value)))
            }
        }
    }

    /// Current file length in bytes
    pub fn size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Flush file data and metadata to disk
    pub fn sync(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.file.sync_all()?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of keys in the index (live and tombstoned)
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Copy of the key → offset index
    pub fn index_snapshot(&self) -> HashMap<Vec<u8>, u64> {
        self.index.snapshot()
    }

    pub fn replay_stats(&self) -> &ReplayStats {
        &self.replay_stats
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// The append critical section
    fn append(&self, key: &[u8], record: &[u8]) -> Result<u64> {
        let _guard = self.write_lock.lock();

        let offset = self.file.metadata()?.len();

        (&self.file).write_all(record)?;
        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.file.sync_data()?;
        }

        // Still under the write lock, so index updates land in append order
        self.index.insert(key, offset);

        Ok(offset)
    }

    /// Decode the header of the record starting at `offset`
    fn read_header_at(&self, offset: u64) -> Result<RecordHeader> {
        let mut buf = [0u8; MAX_HEADER_SIZE];

        pread::read_exact_at(&self.file, &mut buf[..1], offset)?;
        let header_len = RecordHeader::header_len_for(buf[0])?;
        pread::read_exact_at(&self.file, &mut buf[1..header_len], offset + 1)?;

        RecordHeader::decode(&buf[..header_len])
    }
}

impl std::fmt::Debug for LogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFile")
            .field("path", &self.path)
            .field("keys", &self.index.len())
            .finish()
    }
}
