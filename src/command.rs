//! Command definitions
//!
//! The operations an outer layer (HTTP router, CLI, ...) can ask of a
//! `StoreManager`, as plain values.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Read,
    Write,
    Delete,
    AddStore,
    RemoveStore,
}

/// A command against the store manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read a key from a store
    Read { store: String, key: Vec<u8> },

    /// Write a key-value pair to a store
    Write {
        store: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Delete a key from a store
    Delete { store: String, key: Vec<u8> },

    /// Register a new store (no-op if it exists)
    AddStore { name: String },

    /// Remove a store and its files (no-op if absent)
    RemoveStore { name: String },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Read { .. } => CommandType::Read,
            Command::Write { .. } => CommandType::Write,
            Command::Delete { .. } => CommandType::Delete,
            Command::AddStore { .. } => CommandType::AddStore,
            Command::RemoveStore { .. } => CommandType::RemoveStore,
        }
    }

    /// The store this command targets
    pub fn store_name(&self) -> &str {
        match self {
            Command::Read { store, .. }
            | Command::Write { store, .. }
            | Command::Delete { store, .. } => store,
            Command::AddStore { name } | Command::RemoveStore { name } => name,
        }
    }
}
