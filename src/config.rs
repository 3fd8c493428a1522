//! Configuration for Kave
//!
//! Centralized configuration with sensible defaults. A `Config` is handed to
//! the `StoreManager` at construction; nothing below it reads global state.

use std::path::PathBuf;

use crate::error::{KaveError, Result};

/// Main configuration for a Kave instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── store_data.json          (persisted store list, unless overridden)
    ///     └── {store}/                 (one directory per store)
    ///           └── {creation-id}.gkv  (log files, oldest → newest)
    pub data_dir: PathBuf,

    /// Location of the persisted store list. `None` places it in `data_dir`.
    pub registry_path: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Log File Configuration
    // -------------------------------------------------------------------------
    /// Rotate to a new log file once the active one grows past this many bytes
    pub rotation_threshold: u64,

    /// Durability fence applied after every append
    pub sync_strategy: SyncStrategy,
}

/// What happens after the bytes of a record are handed to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync the file data after every append (safest, slowest)
    EveryWrite,

    /// Leave the bytes in the OS page cache; survives a process crash but
    /// not a power loss
    OsBuffered,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./kave_data"),
            registry_path: None,
            rotation_threshold: 64 * 1024 * 1024, // 64 MB
            sync_strategy: SyncStrategy::EveryWrite,
        }
    }
}

impl Config {
    /// Default registry file name inside `data_dir`
    pub const REGISTRY_FILENAME: &'static str = "store_data.json";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolved path of the persisted store list
    pub fn registry_path(&self) -> PathBuf {
        self.registry_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(Self::REGISTRY_FILENAME))
    }

    /// Directory holding the log files of the named store
    pub fn store_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.rotation_threshold == 0 {
            return Err(KaveError::Config(
                "rotation_threshold must be greater than zero".to_string(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(KaveError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set an explicit location for the persisted store list
    pub fn registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.registry_path = Some(path.into());
        self
    }

    /// Set the rotation threshold (in bytes)
    pub fn rotation_threshold(mut self, bytes: u64) -> Self {
        self.config.rotation_threshold = bytes;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
