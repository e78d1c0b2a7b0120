//! # tasksync Store
//!
//! Local store adapter for tasksync.
//!
//! The sync engine never touches persisted records directly. It goes through
//! the [`LocalStore`] capability set: lookup by external identity or UID,
//! insert, in-place update, idempotent delete, and a persisted sync marker
//! slot.
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral collections
//! - [`FileStore`] - Durable CBOR snapshot on disk
//!
//! ## Example
//!
//! ```rust
//! use tasksync_store::{LocalStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! store.set_sync_marker("stoken-1").unwrap();
//! assert_eq!(store.sync_marker().unwrap().as_deref(), Some("stoken-1"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod record;
mod state;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{LocalId, LocalRecord, NewRecord, RecordUpdate};
pub use store::LocalStore;
