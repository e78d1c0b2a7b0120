//! # tasksync Codec
//!
//! Decoding of remote record payloads into domain records.
//!
//! Remote journals carry tasks as iCalendar (`VTODO`) and contacts as vCard.
//! This crate turns a raw payload into **zero or more** typed records; it does
//! not decide what to do when a payload holds none or several of them. That
//! policy belongs to the sync engine.
//!
//! ## Usage
//!
//! ```
//! use tasksync_codec::{Decode, Task};
//!
//! let payload = b"BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:t1\r\nSUMMARY:Milk\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
//! let tasks = Task::decode_all(payload).unwrap();
//! assert_eq!(tasks[0].summary.as_deref(), Some("Milk"));
//! ```
//!
//! This is a pure crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod component;
mod contact;
mod contentline;
mod error;
mod task;

pub use component::Component;
pub use contact::Contact;
pub use contentline::{parse_line, split_list, unescape_text, unfold, ContentLine, Parameter};
pub use error::{CodecError, CodecResult};
pub use task::{DateValue, Task, TaskStatus};

/// Trait for domain records that can be decoded from a remote payload.
pub trait Decode: Sized {
    /// Decodes every record contained in `payload`.
    ///
    /// An empty result is not an error.
    fn decode_all(payload: &[u8]) -> CodecResult<Vec<Self>>;
}
