//! Key index
//!
//! HashMap-based key → offset index with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

/// In-memory index of one log file
///
/// Maps every key to the offset of its most recent record in that file.
/// Tombstones stay in the index (pointing at the tombstone record) so that a
/// read can tell "deleted here" apart from "never written here".
///
/// ## Concurrency:
/// - Lookups take the read lock; many can run in parallel
/// - Mutations take the write lock for the map operation only, never across
///   file I/O
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: RwLock<HashMap<Vec<u8>, u64>>,
}

impl KeyIndex {
    /// Wrap a map produced by replay
    pub fn from_map(map: HashMap<Vec<u8>, u64>) -> Self {
        Self {
            entries: RwLock::new(map),
        }
    }

    /// Offset of the latest record for `key` (read lock)
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.entries.read().get(key).copied()
    }

    /// Point `key` at a new record (write lock)
    pub fn insert(&self, key: &[u8], offset: u64) {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(existing) => *existing = offset,
            None => {
                entries.insert(key.to_vec(), offset);
            }
        }
    }

    /// Number of keys tracked (live and tombstoned)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of the whole map
    pub fn snapshot(&self) -> HashMap<Vec<u8>, u64> {
        self.entries.read().clone()
    }
}
