//! Error types for the sync engine.

use crate::session::SessionState;
use tasksync_codec::CodecError;
use tasksync_protocol::ProtocolError;
use tasksync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Remote payload could not be decoded. The record is skipped.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// Neither an external identity nor a domain uid was available.
    #[error("no identity available for {0}")]
    IdentityMissing(String),

    /// Local store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// The collection does not expose a protocol this engine speaks.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(#[from] ProtocolError),

    /// Session configuration does not fit the collection.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Domain record could not be serialized for the store.
    #[error("body encoding error: {0}")]
    Encoding(String),

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout => true,
            SyncError::Store(StoreError::Unavailable(_)) => true,
            _ => false,
        }
    }

    /// Returns true if the error ends the session.
    ///
    /// Decode and identity errors only skip the record they belong to.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SyncError::Decode(_) | SyncError::IdentityMissing(_))
    }
}

/// Terminal outcome of a failed session.
///
/// Records applied before the failure stay applied; the marker of the
/// failing batch was not committed.
#[derive(Error, Debug)]
#[error("sync of {collection} failed while {stage}: {error}")]
pub struct SessionFailure {
    /// Collection URL.
    pub collection: String,
    /// State the session was in when it failed.
    pub stage: SessionState,
    /// The fatal error.
    #[source]
    pub error: SyncError,
    /// Records reconciled (mutations and no-ops) before the failure.
    pub applied: u64,
}

impl SessionFailure {
    /// Returns true if re-running the session may succeed.
    pub fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::transport_retryable("connection lost").is_retryable());
        assert!(!SyncError::transport_fatal("invalid certificate").is_retryable());
        assert!(SyncError::Timeout.is_retryable());
        assert!(SyncError::Store(StoreError::Unavailable("busy".into())).is_retryable());
        assert!(!SyncError::Store(StoreError::NotFound(1)).is_retryable());
        assert!(!SyncError::Cancelled.is_retryable());
        assert!(!SyncError::Configuration("kind".into()).is_retryable());
    }

    #[test]
    fn recoverable_errors() {
        assert!(!SyncError::IdentityMissing("entry".into()).is_fatal());
        assert!(!SyncError::Decode(CodecError::InvalidUtf8).is_fatal());
        assert!(SyncError::Timeout.is_fatal());
        assert!(SyncError::Cancelled.is_fatal());
    }

    #[test]
    fn error_display() {
        let err = SyncError::Timeout;
        assert_eq!(err.to_string(), "operation timed out");

        let err = SyncError::from(ProtocolError::NoProtocol {
            url: "/tasks/".into(),
        });
        assert!(err.to_string().contains("/tasks/"));

        let failure = SessionFailure {
            collection: "/tasks/".into(),
            stage: SessionState::Reconciling,
            error: SyncError::Cancelled,
            applied: 3,
        };
        let text = failure.to_string();
        assert!(text.contains("reconciling"));
        assert!(text.contains("sync cancelled"));
    }
}
