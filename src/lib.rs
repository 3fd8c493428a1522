//! # Kave
//!
//! A log-structured key-value store with:
//! - Append-only binary log files, one record per write or delete
//! - An in-memory key → offset index per file, rebuilt by replay on open
//! - Single-writer/multi-reader concurrency per file
//! - Named stores spanning several size-rotated log files
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Store Manager                          │
//! │        (name → Store, persisted store registry)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         Store                               │
//! │   writes → active file, reads → newest to oldest, rotation  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼────────────┐
//!          ▼            ▼            ▼
//!   ┌────────────┐ ┌────────────┐ ┌────────────┐
//!   │  LogFile   │ │  LogFile   │ │  LogFile   │   (oldest … active)
//!   │ file+index │ │ file+index │ │ file+index │
//!   └─────┬──────┘ └────────────┘ └────────────┘
//!         │
//!         ▼
//!   ┌────────────┐
//!   │   Record   │  version-tagged header + key + value
//!   │   Codec    │
//!   └────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod logfile;
pub mod store;
pub mod manager;
pub mod command;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use command::Command;
pub use config::{Config, SyncStrategy};
pub use error::{KaveError, Result};
pub use logfile::{LogFile, Lookup};
pub use manager::StoreManager;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Kave
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
