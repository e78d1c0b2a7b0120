//! Local record types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identity of a local record. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalId(pub u64);

impl LocalId {
    /// Returns the raw value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A persisted record, owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRecord {
    /// Row identity.
    pub id: LocalId,
    /// External identity (remote file name / item UID).
    pub file_name: Option<String>,
    /// Domain UID.
    pub uid: String,
    /// Version marker last written by sync.
    pub etag: Option<String>,
    /// Domain kind tag, e.g. `task`, `contact` or `group`.
    pub kind: String,
    /// Serialized domain record.
    pub body: Vec<u8>,
}

/// Content of a record about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// External identity.
    pub file_name: Option<String>,
    /// Domain UID.
    pub uid: String,
    /// Version marker.
    pub etag: Option<String>,
    /// Domain kind tag.
    pub kind: String,
    /// Serialized domain record.
    pub body: Vec<u8>,
}

/// In-place overwrite of an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// New version marker.
    pub etag: Option<String>,
    /// New serialized domain record.
    pub body: Vec<u8>,
}

impl NewRecord {
    pub(crate) fn into_record(self, id: LocalId) -> LocalRecord {
        LocalRecord {
            id,
            file_name: self.file_name,
            uid: self.uid,
            etag: self.etag,
            kind: self.kind,
            body: self.body,
        }
    }
}
