//! Error types for store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An update referenced a record that does not exist.
    #[error("local record #{0} not found")]
    NotFound(u64),

    /// The persisted snapshot is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// Serializing the snapshot failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Another handle holds the store directory.
    #[error("store at {} is locked by another handle", .0.display())]
    Locked(PathBuf),

    /// The store refused the write (e.g. provider unavailable).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
