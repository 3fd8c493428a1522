//! Store Manager
//!
//! Owns every open store and the persisted list of store names.
//!
//! ## Responsibilities
//! - Open every registered store on startup
//! - Create and remove stores, keeping the registry file in step
//! - Route reads, writes and deletes to the named store
//!
//! ## Store name policy
//! - Adding a store that already exists is a silent no-op
//! - Removing a store that does not exist is a silent no-op
//! - Data operations on an unknown store fail with `StoreNotFound`

mod registry;

pub use registry::{Registry, StoreEntry};

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::Config;
use crate::error::{KaveError, Result};
use crate::logfile::Lookup;
use crate::store::Store;

/// Longest allowed store name
pub const MAX_STORE_NAME_LENGTH: usize = 255;

/// Registry of named stores
///
/// ## Concurrency:
/// - `stores`: RwLock over the name → store map; data operations clone the
///   `Arc<Store>` and release the lock before touching the store
/// - `registry`: Mutex held for the whole of an add/remove, so membership
///   changes are serialized and the file always matches the map
pub struct StoreManager {
    config: Config,

    stores: RwLock<HashMap<String, Arc<Store>>>,

    registry: Mutex<Registry>,
}

impl StoreManager {
    /// Open the data directory and every store listed in the registry
    ///
    /// Any store that fails to open fails the whole initialisation.
    pub fn initialise(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let registry_path = config.registry_path();
        let registry = Registry::load(&registry_path)?;

        let mut stores = HashMap::with_capacity(registry.len());
        for name in registry.names() {
            debug!(store = %name, "Opening store");
            let store = Store::open(&config.store_dir(name), name, &config)?;
            stores.insert(name.to_string(), Arc::new(store));
        }

        info!(
            stores = stores.len(),
            registry = %registry_path.display(),
            data_dir = %config.data_dir.display(),
            "Store manager initialised"
        );

        Ok(Self {
            config,
            stores: RwLock::new(stores),
            registry: Mutex::new(registry),
        })
    }

    /// Execute a command
    ///
    /// Only `Read` produces a value; an absent or deleted key reads as empty.
    pub fn execute(&self, command: Command) -> Result<Option<Bytes>> {
        debug!(command = ?command.command_type(), store = %command.store_name(), "Executing command");

        match command {
            Command::Read { store, key } => self.read(&store, &key).map(Some),
            Command::Write { store, key, value } => {
                self.write(&store, &key, &value)?;
                Ok(None)
            }
            Command::Delete { store, key } => {
                self.delete(&store, &key)?;
                Ok(None)
            }
            Command::AddStore { name } => {
                self.add_store(&name)?;
                Ok(None)
            }
            Command::RemoveStore { name } => {
                self.remove_store(&name)?;
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Create and register a store
    ///
    /// Steps:
    /// 1. Validate the name; return early if already registered
    /// 2. Delete any leftover directory of an earlier, removed store
    /// 3. Create the store directory and its first log file
    /// 4. Rewrite the registry file
    /// 5. Publish the store in memory
    pub fn add_store(&self, name: &str) -> Result<()> {
        validate_store_name(name)?;

        let mut registry = self.registry.lock();

        if self.stores.read().contains_key(name) {
            debug!(store = %name, "Store already exists");
            return Ok(());
        }

        // An unregistered name owns no data, whatever is on disk
        let dir = self.config.store_dir(name);
        if dir.exists() {
            warn!(store = %name, dir = %dir.display(), "Removing orphaned store directory");
            fs::remove_dir_all(&dir)?;
        }

        let store = Store::create(&dir, name, &self.config)?;

        let mut updated = registry.clone();
        updated.add(name);
        updated.save(&self.config.registry_path())?;
        *registry = updated;

        self.stores.write().insert(name.to_string(), Arc::new(store));

        info!(store = %name, "Store created");
        Ok(())
    }

    /// Unregister a store and delete its files
    ///
    /// The registry is rewritten before any file is deleted, so a crash in
    /// between leaves an orphaned directory rather than a registry entry
    /// pointing at nothing. Irreversible.
    pub fn remove_store(&self, name: &str) -> Result<()> {
        let mut registry = self.registry.lock();

        let store = match self.stores.read().get(name) {
            Some(store) => Arc::clone(store),
            None => {
                debug!(store = %name, "Store does not exist");
                return Ok(());
            }
        };

        let mut updated = registry.clone();
        updated.remove(name);
        updated.save(&self.config.registry_path())?;
        *registry = updated;

        self.stores.write().remove(name);
        store.destroy()?;

        info!(store = %name, "Store removed");
        Ok(())
    }

    // =========================================================================
    // Data Operations
    // =========================================================================

    /// Write `key` → `value` to the named store
    pub fn write(&self, store: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.store_for(store)?.write(key, value)
    }

    /// Read `key` from the named store
    ///
    /// Deleted and never-written keys both read as an empty value; use
    /// `lookup` to tell them apart.
    pub fn read(&self, store: &str, key: &[u8]) -> Result<Bytes> {
        Ok(self.lookup(store, key)?.into_value().unwrap_or_default())
    }

    /// Read `key` from the named store, keeping the found/deleted/absent distinction
    pub fn lookup(&self, store: &str, key: &[u8]) -> Result<Lookup> {
        self.store_for(store)?.read(key)
    }

    /// Delete `key` from the named store
    pub fn delete(&self, store: &str, key: &[u8]) -> Result<()> {
        self.store_for(store)?.delete(key)
    }

    /// Flush every store to disk
    pub fn sync(&self) -> Result<()> {
        let stores: Vec<Arc<Store>> = self.stores.read().values().cloned().collect();
        for store in stores {
            store.sync()?;
        }
        Ok(())
    }

    /// Close the manager gracefully
    ///
    /// Syncs all stores; file handles close when the stores drop.
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Names of all registered stores, sorted
    pub fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Handle to a registered store
    pub fn store(&self, name: &str) -> Option<Arc<Store>> {
        self.stores.read().get(name).cloned()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn store_for(&self, name: &str) -> Result<Arc<Store>> {
        self.store(name)
            .ok_or_else(|| KaveError::StoreNotFound(name.to_string()))
    }
}

/// Store names become directory names: ASCII letters, digits, `-` and `_`
pub fn validate_store_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_STORE_NAME_LENGTH
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(KaveError::InvalidStoreName(name.to_string()))
    }
}
