//! Fetched change batches and sync markers.

use crate::record::RemoteChangeRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque cursor recording how much of a remote feed has been applied.
///
/// For the current protocol this is the collection's sync token; for the
/// legacy protocol it is the UID of the last applied journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncMarker(String);

impl SyncMarker {
    /// Creates a marker from its wire form.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the wire form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SyncMarker {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One page of remote changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeBatch {
    /// Records in feed order.
    pub records: Vec<RemoteChangeRecord>,
    /// Marker to commit once every record has been applied.
    ///
    /// `None` means the marker does not advance.
    pub marker: Option<SyncMarker>,
    /// True if more records are available after this batch.
    pub has_more: bool,
}

impl ChangeBatch {
    /// Creates a batch.
    pub fn new(records: Vec<RemoteChangeRecord>, marker: Option<SyncMarker>, has_more: bool) -> Self {
        Self {
            records,
            marker,
            has_more,
        }
    }

    /// Creates an empty, final batch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
