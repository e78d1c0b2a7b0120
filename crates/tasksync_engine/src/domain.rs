//! Domain capability sets plugged into the reconciler.

use crate::error::{SyncError, SyncResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tasksync_codec::{CodecResult, Contact, Decode, Task};
use tasksync_protocol::CollectionKind;

/// Kind tag stored for tasks.
pub const KIND_TASK: &str = "task";
/// Kind tag stored for individual contacts.
pub const KIND_CONTACT: &str = "contact";
/// Kind tag stored for contact groups.
pub const KIND_GROUP: &str = "group";

/// Everything the engine needs to know about one record domain.
///
/// The reconciliation algorithm is written once against this trait; tasks
/// and contacts only differ in how payloads are decoded and stored.
pub trait SyncDomain: Send + Sync + 'static {
    /// Decoded domain record.
    type Record: Send;

    /// Collection kind this domain syncs.
    const KIND: CollectionKind;

    /// Payload name used in log messages.
    const PAYLOAD_NAME: &'static str;

    /// Decodes every record contained in a remote payload.
    fn decode(payload: &[u8]) -> CodecResult<Vec<Self::Record>>;

    /// Returns the record's UID, if it has a non-empty one.
    fn uid_of(record: &Self::Record) -> Option<String>;

    /// Returns the kind tag stored alongside the record.
    fn kind_of(record: &Self::Record) -> &'static str;

    /// Serializes the record into a local record body.
    fn encode_body(record: &Self::Record) -> SyncResult<Vec<u8>>;

    /// Deserializes a local record body.
    fn decode_body(body: &[u8]) -> SyncResult<Self::Record>;
}

/// Task lists holding VTODO components.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskDomain;

impl SyncDomain for TaskDomain {
    type Record = Task;

    const KIND: CollectionKind = CollectionKind::Tasks;
    const PAYLOAD_NAME: &'static str = "VCALENDAR";

    fn decode(payload: &[u8]) -> CodecResult<Vec<Task>> {
        Task::decode_all(payload)
    }

    fn uid_of(record: &Task) -> Option<String> {
        record.uid.clone().filter(|uid| !uid.is_empty())
    }

    fn kind_of(_record: &Task) -> &'static str {
        KIND_TASK
    }

    fn encode_body(record: &Task) -> SyncResult<Vec<u8>> {
        to_cbor(record)
    }

    fn decode_body(body: &[u8]) -> SyncResult<Task> {
        from_cbor(body)
    }
}

/// Address books holding VCARDs, where a card is a contact or a group.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactDomain;

impl SyncDomain for ContactDomain {
    type Record = Contact;

    const KIND: CollectionKind = CollectionKind::AddressBook;
    const PAYLOAD_NAME: &'static str = "VCARD";

    fn decode(payload: &[u8]) -> CodecResult<Vec<Contact>> {
        Contact::decode_all(payload)
    }

    fn uid_of(record: &Contact) -> Option<String> {
        record.uid.clone().filter(|uid| !uid.is_empty())
    }

    fn kind_of(record: &Contact) -> &'static str {
        if record.group {
            KIND_GROUP
        } else {
            KIND_CONTACT
        }
    }

    fn encode_body(record: &Contact) -> SyncResult<Vec<u8>> {
        to_cbor(record)
    }

    fn decode_body(body: &[u8]) -> SyncResult<Contact> {
        from_cbor(body)
    }
}

fn to_cbor<T: Serialize>(value: &T) -> SyncResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|e| SyncError::Encoding(e.to_string()))?;
    Ok(bytes)
}

fn from_cbor<T: DeserializeOwned>(body: &[u8]) -> SyncResult<T> {
    ciborium::from_reader(body).map_err(|e| SyncError::Encoding(e.to_string()))
}
