//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised by protocol selection and record encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The collection advertises neither the current nor the legacy protocol.
    #[error("collection {url} exposes neither a current collection nor a legacy journal")]
    NoProtocol {
        /// Collection URL.
        url: String,
    },

    /// Failed to encode a record.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// Failed to decode a record.
    #[error("decoding failed: {0}")]
    Decoding(String),
}
