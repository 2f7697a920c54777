//! Error types for nvstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for nvstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Integrity Errors
    // -------------------------------------------------------------------------
    /// The file's checksum trailer does not match its contents. The file is
    /// treated as nonexistent, never partially trusted.
    #[error("integrity failure: {0}")]
    Integrity(String),

    // -------------------------------------------------------------------------
    // Media Errors
    // -------------------------------------------------------------------------
    /// The storage medium refused an operation (mount failure, short write,
    /// short read). Recoverable at the commit layer: the previous file is
    /// retained.
    #[error("media error: {0}")]
    Media(String),

    /// No valid persistence file exists on the medium. Callers fall back to
    /// compiled-in defaults.
    #[error("no persisted data")]
    NoData,
}
