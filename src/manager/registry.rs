//! Persisted store list
//!
//! A small JSON document naming every store that should be opened on
//! startup. It is rewritten in full on every membership change:
//!
//! ```text
//! {"Stores":[{"Name":"people"},{"Name":"orders"}]}
//! ```

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{KaveError, Result};

use super::validate_store_name;

/// The set of known stores, in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Registry {
    #[serde(default, deserialize_with = "null_as_empty")]
    stores: Vec<StoreEntry>,
}

/// One registered store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoreEntry {
    pub name: String,
}

impl Registry {
    /// Load the registry; a missing or blank file is an empty registry
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::default());
        }

        let registry: Registry = serde_json::from_slice(&bytes)?;

        for (i, entry) in registry.stores.iter().enumerate() {
            if validate_store_name(&entry.name).is_err() {
                return Err(KaveError::Registry(format!(
                    "invalid store name {:?} in {}",
                    entry.name,
                    path.display()
                )));
            }
            if registry.stores[..i].iter().any(|e| e.name == entry.name) {
                return Err(KaveError::Registry(format!(
                    "store {:?} listed more than once in {}",
                    entry.name,
                    path.display()
                )));
            }
        }

        Ok(registry)
    }

    /// Replace the file at `path` with this registry
    ///
    /// Written to a sibling temp file, synced, then renamed into place, so a
    /// crash leaves either the old or the new list.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores.iter().any(|entry| entry.name == name)
    }

    /// Append `name`; returns false if it was already present
    pub fn add(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.stores.push(StoreEntry {
            name: name.to_string(),
        });
        true
    }

    /// Drop `name`; returns false if it was not present
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.stores.len();
        self.stores.retain(|entry| entry.name != name);
        self.stores.len() != before
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stores.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

// Older writers emit `"Stores": null` for an empty list
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<StoreEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<StoreEntry>>::deserialize(deserializer)?.unwrap_or_default())
}
