//! # tasksync Testkit
//!
//! Test utilities for tasksync.
//!
//! This crate provides:
//! - iCalendar and vCard payload builders
//! - Remote change record shorthands for both protocols
//! - Scratch file stores in temporary directories
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use tasksync_testkit::prelude::*;
//!
//! let record = item("t1", "e1", vtodo("t1", "Buy milk"));
//! assert_eq!(record.identity(), Some("t1"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
