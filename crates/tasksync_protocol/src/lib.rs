//! # tasksync Protocol
//!
//! Wire-level contracts shared by the sync engine and its transports.
//!
//! This crate provides:
//! - `RemoteChangeRecord` for both the current item protocol and the legacy
//!   journal protocol
//! - `SyncAction` legacy action tags
//! - `ChangeBatch` and `SyncMarker` for paging through a remote feed
//! - `CollectionDescriptor` and the protocol selector
//! - CBOR encoding of records
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod collection;
mod error;
mod record;

pub use batch::{ChangeBatch, SyncMarker};
pub use collection::{select_mode, CollectionDescriptor, CollectionKind, ProtocolMode};
pub use error::{ProtocolError, ProtocolResult};
pub use record::{RemoteChangeRecord, SyncAction};
