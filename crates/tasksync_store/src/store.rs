//! Local store trait definition.

use crate::error::StoreResult;
use crate::record::{LocalId, LocalRecord, NewRecord, RecordUpdate};

/// Capability set over one local collection.
///
/// The store owns every local record; callers receive owned copies and
/// mutate only through [`insert`](Self::insert), [`update`](Self::update) and
/// [`delete`](Self::delete).
///
/// # Invariants
///
/// - Lookups are exact-match and case-sensitive
/// - When several records share a UID, the lowest [`LocalId`] wins
/// - `delete` of a missing record is a no-op
/// - Every successful mutation is durable when the call returns
/// - Reads take `&self`, mutations `&mut self`: one session owns the handle
pub trait LocalStore: Send {
    /// Finds a record by external identity.
    fn find_by_file_name(&self, file_name: &str) -> StoreResult<Option<LocalRecord>>;

    /// Finds a record by domain UID.
    fn find_by_uid(&self, uid: &str) -> StoreResult<Option<LocalRecord>>;

    /// Returns the record with the given row identity.
    fn get(&self, id: LocalId) -> StoreResult<Option<LocalRecord>>;

    /// Inserts a record and returns its new row identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    fn insert(&mut self, record: NewRecord) -> StoreResult<LocalId>;

    /// Overwrites version marker and body of an existing record in place.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::NotFound`] if `id` does not exist, or an
    /// error if the change cannot be persisted.
    fn update(&mut self, id: LocalId, update: RecordUpdate) -> StoreResult<()>;

    /// Deletes a record. Deleting a missing record succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    fn delete(&mut self, id: LocalId) -> StoreResult<()>;

    /// Returns the last committed sync marker.
    fn sync_marker(&self) -> StoreResult<Option<String>>;

    /// Persists a new sync marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be persisted.
    fn set_sync_marker(&mut self, marker: &str) -> StoreResult<()>;

    /// Returns all records ordered by row identity.
    fn records(&self) -> StoreResult<Vec<LocalRecord>>;

    /// Returns the number of records.
    fn len(&self) -> StoreResult<usize> {
        Ok(self.records()?.len())
    }

    /// Returns true if the store holds no records.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}
