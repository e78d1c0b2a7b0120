//! Transport layer abstraction for sync sessions.

use crate::error::SyncResult;
use std::sync::Arc;
use tasksync_protocol::{ChangeBatch, SyncMarker};

/// A sync transport fetches remote changes for one collection.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-process journals, mocks for testing).
/// Implementations enforce their own request timeouts and report them as
/// [`crate::SyncError::Timeout`].
pub trait SyncTransport: Send + Sync {
    /// Fetches current-protocol items changed after `since`.
    fn fetch_items(
        &self,
        collection: &str,
        since: Option<&SyncMarker>,
        limit: u32,
    ) -> SyncResult<ChangeBatch>;

    /// Fetches legacy journal entries after `since`.
    fn fetch_entries(
        &self,
        journal: &str,
        since: Option<&SyncMarker>,
        limit: u32,
    ) -> SyncResult<ChangeBatch>;

    /// Tells the server a batch has been durably applied.
    fn commit_marker(&self, _collection: &str, _marker: &SyncMarker) -> SyncResult<()> {
        Ok(())
    }
}

impl<T: SyncTransport + ?Sized> SyncTransport for Arc<T> {
    fn fetch_items(
        &self,
        collection: &str,
        since: Option<&SyncMarker>,
        limit: u32,
    ) -> SyncResult<ChangeBatch> {
        (**self).fetch_items(collection, since, limit)
    }

    fn fetch_entries(
        &self,
        journal: &str,
        since: Option<&SyncMarker>,
        limit: u32,
    ) -> SyncResult<ChangeBatch> {
        (**self).fetch_entries(journal, since, limit)
    }

    fn commit_marker(&self, collection: &str, marker: &SyncMarker) -> SyncResult<()> {
        (**self).commit_marker(collection, marker)
    }
}
