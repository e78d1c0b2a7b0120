//! Collection metadata and protocol selection.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a collection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Task list (VTODO).
    Tasks,
    /// Address book (VCARD).
    AddressBook,
    /// Calendar (VEVENT).
    Calendar,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionKind::Tasks => "tasks",
            CollectionKind::AddressBook => "address book",
            CollectionKind::Calendar => "calendar",
        };
        f.write_str(name)
    }
}

/// Which reconciliation path a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolMode {
    /// Item-based protocol with per-item etag and deletion flag.
    Current,
    /// Flat journal of entries with explicit action tags.
    Legacy,
}

/// Metadata about one remote collection, supplied by the account layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Collection URL (local collection key).
    pub url: String,
    /// Human readable name.
    pub display_name: Option<String>,
    /// Collection content type.
    pub kind: CollectionKind,
    /// Handle of the collection on a current-protocol server.
    pub collection_handle: Option<String>,
    /// Journal endpoint on a legacy server.
    pub legacy_journal: Option<String>,
}

impl CollectionDescriptor {
    /// Creates a descriptor for a current-protocol collection.
    pub fn current(url: impl Into<String>, kind: CollectionKind, handle: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_name: None,
            kind,
            collection_handle: Some(handle.into()),
            legacy_journal: None,
        }
    }

    /// Creates a descriptor for a legacy journal.
    pub fn legacy(url: impl Into<String>, kind: CollectionKind, journal: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_name: None,
            kind,
            collection_handle: None,
            legacy_journal: Some(journal.into()),
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Returns the display name, falling back to the URL.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.url)
    }
}

/// Chooses the reconciliation path for a collection.
///
/// A current collection handle takes precedence; a collection that only has
/// a legacy journal uses the legacy path.
///
/// # Errors
///
/// Returns [`ProtocolError::NoProtocol`] if neither signal is present.
pub fn select_mode(descriptor: &CollectionDescriptor) -> ProtocolResult<ProtocolMode> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

    if present(&descriptor.collection_handle) {
        Ok(ProtocolMode::Current)
    } else if present(&descriptor.legacy_journal) {
        Ok(ProtocolMode::Legacy)
    } else {
        Err(ProtocolError::NoProtocol {
            url: descriptor.url.clone(),
        })
    }
}
