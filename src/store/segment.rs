//! Log file naming and discovery
//!
//! Each store directory holds log files named `{creation-id}.gkv`, where the
//! id is a nanosecond timestamp zero-padded to 20 digits so that lexical order
//! and creation order agree.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::error::{KaveError, Result};

/// The file extension used for log files
pub const LOG_FILE_EXTENSION: &str = "gkv";

/// A log file found in a store directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredFile {
    /// Creation id parsed from the file name
    pub id: u64,

    pub path: PathBuf,
}

/// Canonical file name for a log file id
///
/// `1700000000000000000` → `"01700000000000000000.gkv"`
pub fn log_filename(id: u64) -> String {
    format!("{id:020}.{LOG_FILE_EXTENSION}")
}

/// Full path of a log file inside a store directory
pub fn log_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(log_filename(id))
}

/// Parse the id out of a log file name
///
/// Accepts unpadded ids too, as written by older versions.
pub fn parse_log_filename(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(LOG_FILE_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// List the log files of a store directory, oldest first
///
/// Anything that is not a log file is skipped with a warning.
pub fn list_log_files(dir: &Path) -> Result<Vec<DiscoveredFile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        match parse_log_filename(&name) {
            Some(id) if path.is_file() => files.push(DiscoveredFile { id, path }),
            _ => warn!(file = %path.display(), "Skipping unrecognised file in store directory"),
        }
    }

    files.sort();

    debug!(count = files.len(), dir = %dir.display(), "Discovered log files");

    Ok(files)
}

/// Id for a new log file: the current time in nanoseconds, forced past
/// `previous` so ids never repeat or go backwards
pub fn next_file_id(previous: Option<u64>) -> Result<u64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    match previous {
        Some(prev) if now <= prev => prev
            .checked_add(1)
            .ok_or(KaveError::FileIdsExhausted(prev)),
        _ => Ok(now),
    }
}
