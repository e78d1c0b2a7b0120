//! Remote change records.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action tag of a legacy journal entry.
///
/// The legacy journal tags every entry with one of `ADD`, `CHANGE` or
/// `DELETE`. Unknown tags are preserved; the reconciler treats anything that
/// is not `ADD` or `CHANGE` as a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SyncAction {
    /// Record was created.
    Add,
    /// Record was modified.
    Change,
    /// Record was removed.
    Delete,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl SyncAction {
    /// Parses a wire tag. Matching is case-sensitive.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "ADD" => SyncAction::Add,
            "CHANGE" => SyncAction::Change,
            "DELETE" => SyncAction::Delete,
            other => SyncAction::Other(other.to_string()),
        }
    }

    /// Returns the wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            SyncAction::Add => "ADD",
            SyncAction::Change => "CHANGE",
            SyncAction::Delete => "DELETE",
            SyncAction::Other(tag) => tag,
        }
    }

    /// Returns true for `ADD` and `CHANGE`.
    pub fn is_upsert(&self) -> bool {
        matches!(self, SyncAction::Add | SyncAction::Change)
    }
}

impl From<String> for SyncAction {
    fn from(tag: String) -> Self {
        SyncAction::parse(&tag)
    }
}

impl From<SyncAction> for String {
    fn from(action: SyncAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of remote change.
///
/// Current-protocol items carry an `external_id`, an `etag` and an
/// `is_deletion` flag. Legacy journal entries carry an `action` tag and the
/// record content; their identity lives inside the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteChangeRecord {
    /// Stable opaque identity (item UID / file name).
    pub external_id: Option<String>,
    /// Opaque version stamp.
    pub etag: Option<String>,
    /// Serialized domain content.
    pub payload: Vec<u8>,
    /// True if the item was deleted remotely.
    pub is_deletion: bool,
    /// Legacy action tag.
    pub action: Option<SyncAction>,
}

impl RemoteChangeRecord {
    /// Creates a current-protocol item.
    pub fn item(
        external_id: impl Into<String>,
        etag: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        is_deletion: bool,
    ) -> Self {
        Self {
            external_id: Some(external_id.into()),
            etag: Some(etag.into()),
            payload: payload.into(),
            is_deletion,
            action: None,
        }
    }

    /// Creates a legacy journal entry.
    pub fn entry(action: SyncAction, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            external_id: None,
            etag: None,
            payload: payload.into(),
            is_deletion: action == SyncAction::Delete,
            action: Some(action),
        }
    }

    /// Returns the external identity if present and non-empty.
    pub fn identity(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Returns the payload size in bytes.
    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    /// Encodes to CBOR bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| ProtocolError::Encoding(e.to_string()))?;
        Ok(bytes)
    }

    /// Decodes from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| ProtocolError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tags() {
        assert_eq!(SyncAction::parse("ADD"), SyncAction::Add);
        assert_eq!(SyncAction::parse("CHANGE"), SyncAction::Change);
        assert_eq!(SyncAction::parse("DELETE"), SyncAction::Delete);
        assert_eq!(SyncAction::parse("add"), SyncAction::Other("add".into()));

        assert!(SyncAction::Add.is_upsert());
        assert!(SyncAction::Change.is_upsert());
        assert!(!SyncAction::Delete.is_upsert());
        assert!(!SyncAction::Other("MOVE".into()).is_upsert());
        assert_eq!(SyncAction::Other("MOVE".into()).to_string(), "MOVE");
    }

    #[test]
    fn item_constructor() {
        let record = RemoteChangeRecord::item("t2", "e1", b"body".to_vec(), false);
        assert_eq!(record.identity(), Some("t2"));
        assert_eq!(record.etag.as_deref(), Some("e1"));
        assert!(!record.is_deletion);
        assert!(record.action.is_none());
        assert_eq!(record.payload_size(), 4);
    }

    #[test]
    fn entry_constructor() {
        let record = RemoteChangeRecord::entry(SyncAction::Delete, "x");
        assert!(record.is_deletion);
        assert_eq!(record.identity(), None);
        assert_eq!(record.action, Some(SyncAction::Delete));
    }

    #[test]
    fn empty_external_id_is_no_identity() {
        let record = RemoteChangeRecord::item("", "e", Vec::new(), true);
        assert_eq!(record.identity(), None);
    }

    #[test]
    fn cbor_preserves_unknown_action() {
        let record = RemoteChangeRecord::entry(SyncAction::Other("MOVE".into()), "payload");
        let decoded = RemoteChangeRecord::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn decode_garbage_fails() {
        let err = RemoteChangeRecord::decode(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, ProtocolError::Decoding(_)));
    }
}
