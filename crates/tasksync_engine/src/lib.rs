//! # tasksync Engine
//!
//! Reconciliation engine and session coordinator for tasksync.
//!
//! This crate provides:
//! - Protocol-aware reconciliation of remote change records (current item
//!   protocol and legacy journal protocol)
//! - Domain capability sets for tasks and contacts
//! - Session state machine (idle → preparing → fetching → reconciling →
//!   committing → done)
//! - Per-batch marker commits and retry with exponential backoff
//! - Transport abstraction with an in-process journal
//! - Observers for logging and inspection
//!
//! ## Key Invariants
//!
//! - The protocol is selected once per session and never re-inspected
//! - Remote feed order is authoritative (last writer wins)
//! - A batch marker is committed only after every record of the batch is applied
//! - Re-applying a record is idempotent
//! - A delete of a missing record is a logged no-op

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod domain;
mod error;
mod journal;
mod observer;
mod reconcile;
mod session;
mod transport;

pub use config::{NetworkState, RetryConfig, SyncConfig};
pub use domain::{ContactDomain, SyncDomain, TaskDomain, KIND_CONTACT, KIND_GROUP, KIND_TASK};
pub use error::{SessionFailure, SyncError, SyncResult};
pub use journal::MemoryJournal;
pub use observer::{RecordingObserver, SyncEvent, SyncObserver, TracingObserver};
pub use reconcile::{AppliedMutation, NoOpReason, Reconciler, SyncCounters};
pub use session::{CancelHandle, SessionReport, SessionState, SyncManager};
pub use transport::SyncTransport;
