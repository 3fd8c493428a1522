//! Error types for Kave
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KaveError
pub type Result<T> = std::result::Result<T, KaveError>;

/// Unified error type for Kave operations
#[derive(Debug, Error)]
pub enum KaveError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Format Errors
    // -------------------------------------------------------------------------
    #[error("Unrecognised metadata version: {0}")]
    UnrecognisedVersion(u8),

    #[error("Unrecognised log entry type: {0}")]
    UnrecognisedEntryType(u8),

    #[error("Truncated record at offset {offset}: expected {expected} bytes, {available} available")]
    TruncatedRecord {
        offset: u64,
        expected: u64,
        available: u64,
    },

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Key too long: {len} bytes (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("Value too long: {len} bytes (max {max})")]
    ValueTooLong { len: usize, max: usize },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Invalid store name: {0:?}")]
    InvalidStoreName(String),

    #[error("No log file id left after {0}")]
    FileIdsExhausted(u64),

    // -------------------------------------------------------------------------
    // Registry Errors
    // -------------------------------------------------------------------------
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Registry JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KaveError {
    /// True for errors caused by the bytes on disk rather than by the caller
    /// or the operating system.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            KaveError::UnrecognisedVersion(_)
                | KaveError::UnrecognisedEntryType(_)
                | KaveError::TruncatedRecord { .. }
        )
    }
}
