//! Store Module
//!
//! A named namespace spread over one or more log files.
//!
//! ## Responsibilities
//! - Discover and replay a store's log files on startup
//! - Route writes and deletes to the active (newest) file
//! - Rotate to a new file once the active one passes the size threshold
//! - Search files newest → oldest for reads
//!
//! ## Layout
//! ```text
//! {data_dir}/{store}/
//!   ├── 01700000000000000000.gkv   (oldest)
//!   ├── 01700000000500000000.gkv
//!   └── 01700000001000000000.gkv   (active)
//! ```

pub mod segment;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::config::{Config, SyncStrategy};
use crate::error::{KaveError, Result};
use crate::logfile::{LogFile, Lookup};

/// The files of a store. There is always an active file.
struct FileSet {
    /// Read-only files, oldest → newest
    older: Vec<Arc<LogFile>>,

    /// The file accepting writes
    active: Arc<LogFile>,
}

impl FileSet {
    /// All files, newest → oldest
    fn newest_first(&self) -> Vec<Arc<LogFile>> {
        std::iter::once(&self.active)
            .chain(self.older.iter().rev())
            .cloned()
            .collect()
    }
}

/// A named set of log files
///
/// ## Concurrency:
/// - `files`: RwLock. Writes and deletes hold the read lock while appending,
///   so a rotation (write lock) waits for in-flight appends to the old file
/// - `rotation`: serializes the rotate decision and file creation; holds the
///   id of the newest file
/// - Reads snapshot the file list and release the lock before any I/O
pub struct Store {
    name: String,

    /// Directory holding this store's log files
    dir: PathBuf,

    files: RwLock<FileSet>,

    rotation: Mutex<u64>,

    rotation_threshold: u64,

    sync_strategy: SyncStrategy,
}

impl Store {
    /// Create the store directory (if needed) and open the store
    pub fn create(dir: &Path, name: &str, config: &Config) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Self::open(dir, name, config)
    }

    /// Open an existing store directory
    ///
    /// On open:
    /// 1. Discover log files, ordered by creation id
    /// 2. Open and replay each (any failure fails the open)
    /// 3. If there are none, start a fresh active file
    pub fn open(dir: &Path, name: &str, config: &Config) -> Result<Self> {
        if !dir.is_dir() {
            return Err(KaveError::StoreNotFound(name.to_string()));
        }

        let discovered = segment::list_log_files(dir)?;

        let mut files = Vec::with_capacity(discovered.len().max(1));
        for found in &discovered {
            files.push(Arc::new(LogFile::open(&found.path, config.sync_strategy)?));
        }

        let (active, last_id) = match (files.pop(), discovered.last()) {
            (Some(active), Some(found)) => (active, found.id),
            _ => {
                let id = segment::next_file_id(None)?;
                let path = segment::log_path(dir, id);
                let active = Arc::new(LogFile::open(&path, config.sync_strategy)?);
                info!(store = %name, file = %path.display(), "Created initial log file");
                (active, id)
            }
        };

        info!(store = %name, files = files.len() + 1, "Store opened");

        Ok(Self {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            files: RwLock::new(FileSet {
                older: files,
                active,
            }),
            rotation: Mutex::new(last_id),
            rotation_threshold: config.rotation_threshold,
            sync_strategy: config.sync_strategy,
        })
    }

    /// Write `key` → `value` to the active file, then rotate if it is full
    pub fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let active = {
            let files = self.files.read();
            files.active.write(key, value)?;
            Arc::clone(&files.active)
        };

        self.rotate_if_needed(&active)
    }

    /// Tombstone `key` in the active file, shadowing any older record
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let active = {
            let files = self.files.read();
            files.active.delete(key)?;
            Arc::clone(&files.active)
        };

        self.rotate_if_needed(&active)
    }

    /// Read `key`, searching files newest → oldest
    ///
    /// The first file that knows the key (live or tombstoned) decides.
    pub fn read(&self, key: &[u8]) -> Result<Lookup> {
        let files = self.files.read().newest_first();

        for file in files {
            let lookup = file.read(key)?;
            if lookup.is_definitive() {
                return Ok(lookup);
            }
        }

        Ok(Lookup::NotPresent)
    }

    /// Flush every file to disk
    pub fn sync(&self) -> Result<()> {
        for file in self.files.read().newest_first() {
            file.sync()?;
        }
        Ok(())
    }

    /// Delete the store directory and every log file in it
    ///
    /// The store must not be used afterwards.
    pub fn destroy(&self) -> Result<()> {
        fs::remove_dir_all(&self.dir)?;
        info!(store = %self.name, dir = %self.dir.display(), "Store files removed");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of log files, including the active one
    pub fn file_count(&self) -> usize {
        self.files.read().older.len() + 1
    }

    /// Paths of all log files, oldest → newest
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let files = self.files.read();
        files
            .older
            .iter()
            .chain(std::iter::once(&files.active))
            .map(|file| file.path().to_path_buf())
            .collect()
    }

    /// Bytes on disk across all log files
    pub fn total_size(&self) -> Result<u64> {
        let mut total = 0;
        for file in self.files.read().newest_first() {
            total += file.size()?;
        }
        Ok(total)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Start a new active file if `trigger` (the file just written) is full
    fn rotate_if_needed(&self, trigger: &Arc<LogFile>) -> Result<()> {
        let size = trigger.size()?;
        if size <= self.rotation_threshold {
            return Ok(());
        }

        let mut last_id = self.rotation.lock();

        // Someone else rotated while we waited
        if !Arc::ptr_eq(&self.files.read().active, trigger) {
            return Ok(());
        }

        let id = segment::next_file_id(Some(*last_id))?;
        let path = segment::log_path(&self.dir, id);
        let new_file = Arc::new(LogFile::open(&path, self.sync_strategy)?);

        {
            let mut files = self.files.write();
            let previous = std::mem::replace(&mut files.active, new_file);
            files.older.push(previous);
        }
        *last_id = id;

        info!(
            store = %self.name,
            file = %path.display(),
            previous_size = size,
            "Rotated to new log file"
        );

        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("files", &self.file_count())
            .finish()
    }
}
