//! In-memory store for tests and ephemeral collections.

use crate::error::{StoreError, StoreResult};
use crate::record::{LocalId, LocalRecord, NewRecord, RecordUpdate};
use crate::state::CollectionState;
use crate::store::LocalStore;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Default)]
struct FaultPlan {
    /// Remaining successful writes before writes start failing.
    writes_left: Option<u64>,
}

/// An in-memory local store.
///
/// Clones share the same underlying collection, so a test can keep a handle
/// for inspection while a sync session owns another.
///
/// # Example
///
/// ```rust
/// use tasksync_store::{LocalStore, MemoryStore, NewRecord};
///
/// let mut store = MemoryStore::new();
/// let id = store
///     .insert(NewRecord {
///         file_name: Some("t1".into()),
///         uid: "t1".into(),
///         etag: Some("e1".into()),
///         kind: "task".into(),
///         body: vec![],
///     })
///     .unwrap();
/// assert_eq!(store.find_by_file_name("t1").unwrap().unwrap().id, id);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<CollectionState>>,
    faults: Arc<RwLock<FaultPlan>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write after the next `writes` successful ones fail with
    /// [`StoreError::Unavailable`]. Marker writes count as writes.
    pub fn fail_writes_after(&self, writes: u64) {
        self.faults.write().writes_left = Some(writes);
    }

    /// Removes any injected failure.
    pub fn clear_faults(&self) {
        self.faults.write().writes_left = None;
    }

    fn check_write(&self) -> StoreResult<()> {
        let mut faults = self.faults.write();
        match faults.writes_left.as_mut() {
            Some(0) => Err(StoreError::Unavailable("injected write failure".into())),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl LocalStore for MemoryStore {
    fn find_by_file_name(&self, file_name: &str) -> StoreResult<Option<LocalRecord>> {
        Ok(self.state.read().find_by_file_name(file_name))
    }

    fn find_by_uid(&self, uid: &str) -> StoreResult<Option<LocalRecord>> {
        Ok(self.state.read().find_by_uid(uid))
    }

    fn get(&self, id: LocalId) -> StoreResult<Option<LocalRecord>> {
        Ok(self.state.read().get(id))
    }

    fn insert(&mut self, record: NewRecord) -> StoreResult<LocalId> {
        self.check_write()?;
        Ok(self.state.write().insert(record))
    }

    fn update(&mut self, id: LocalId, update: RecordUpdate) -> StoreResult<()> {
        self.check_write()?;
        self.state.write().update(id, update)
    }

    fn delete(&mut self, id: LocalId) -> StoreResult<()> {
        self.check_write()?;
        self.state.write().delete(id);
        Ok(())
    }

    fn sync_marker(&self) -> StoreResult<Option<String>> {
        Ok(self.state.read().sync_marker())
    }

    fn set_sync_marker(&mut self, marker: &str) -> StoreResult<()> {
        self.check_write()?;
        self.state.write().set_sync_marker(marker);
        Ok(())
    }

    fn records(&self) -> StoreResult<Vec<LocalRecord>> {
        Ok(self.state.read().records())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.state.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(file_name: &str) -> NewRecord {
        NewRecord {
            file_name: Some(file_name.into()),
            uid: file_name.into(),
            etag: Some("e1".into()),
            kind: "task".into(),
            body: b"body".to_vec(),
        }
    }

    #[test]
    fn memory_new_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty().unwrap());
        assert!(store.sync_marker().unwrap().is_none());
    }

    #[test]
    fn memory_insert_and_find() {
        let mut store = MemoryStore::new();
        let id = store.insert(task("t1")).unwrap();

        let by_name = store.find_by_file_name("t1").unwrap().unwrap();
        let by_uid = store.find_by_uid("t1").unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(by_uid.id, id);
        assert_eq!(store.get(id).unwrap().unwrap().etag.as_deref(), Some("e1"));
    }

    #[test]
    fn memory_update_in_place() {
        let mut store = MemoryStore::new();
        let id = store.insert(task("t1")).unwrap();

        store
            .update(
                id,
                RecordUpdate {
                    etag: Some("e2".into()),
                    body: b"new".to_vec(),
                },
            )
            .unwrap();

        let record = store.get(id).unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.etag.as_deref(), Some("e2"));
        assert_eq!(record.body, b"new");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn memory_update_missing_fails() {
        let mut store = MemoryStore::new();
        let result = store.update(
            LocalId(9),
            RecordUpdate {
                etag: None,
                body: vec![],
            },
        );
        assert!(matches!(result, Err(StoreError::NotFound(9))));
    }

    #[test]
    fn memory_delete_is_idempotent() {
        let mut store = MemoryStore::new();
        let id = store.insert(task("t1")).unwrap();
        store.delete(id).unwrap();
        store.delete(id).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn memory_clones_share_state() {
        let mut store = MemoryStore::new();
        let observer = store.clone();
        store.insert(task("t1")).unwrap();
        store.set_sync_marker("m1").unwrap();
        assert_eq!(observer.len().unwrap(), 1);
        assert_eq!(observer.sync_marker().unwrap().as_deref(), Some("m1"));
    }

    #[test]
    fn memory_injected_failure() {
        let mut store = MemoryStore::new();
        store.fail_writes_after(1);

        store.insert(task("t1")).unwrap();
        let err = store.insert(task("t2")).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.set_sync_marker("m").is_err());
        assert_eq!(store.len().unwrap(), 1);

        store.clear_faults();
        store.insert(task("t2")).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }
}
