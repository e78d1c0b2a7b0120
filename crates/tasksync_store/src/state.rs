//! Collection state shared by the store implementations.

use crate::error::{StoreError, StoreResult};
use crate::record::{LocalId, LocalRecord, NewRecord, RecordUpdate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of one collection: records, id allocator and sync marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CollectionState {
    records: BTreeMap<LocalId, LocalRecord>,
    next_id: u64,
    sync_marker: Option<String>,
}

impl CollectionState {
    pub(crate) fn find_by_file_name(&self, file_name: &str) -> Option<LocalRecord> {
        self.records
            .values()
            .find(|r| r.file_name.as_deref() == Some(file_name))
            .cloned()
    }

    pub(crate) fn find_by_uid(&self, uid: &str) -> Option<LocalRecord> {
        self.records.values().find(|r| r.uid == uid).cloned()
    }

    pub(crate) fn get(&self, id: LocalId) -> Option<LocalRecord> {
        self.records.get(&id).cloned()
    }

    pub(crate) fn insert(&mut self, record: NewRecord) -> LocalId {
        self.next_id += 1;
        let id = LocalId(self.next_id);
        self.records.insert(id, record.into_record(id));
        id
    }

    pub(crate) fn update(&mut self, id: LocalId, update: RecordUpdate) -> StoreResult<()> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id.as_u64()))?;
        record.etag = update.etag;
        record.body = update.body;
        Ok(())
    }

    /// Returns true if a record was removed.
    pub(crate) fn delete(&mut self, id: LocalId) -> bool {
        self.records.remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: LocalId) -> bool {
        self.records.contains_key(&id)
    }

    pub(crate) fn sync_marker(&self) -> Option<String> {
        self.sync_marker.clone()
    }

    pub(crate) fn set_sync_marker(&mut self, marker: &str) {
        self.sync_marker = Some(marker.to_string());
    }

    pub(crate) fn records(&self) -> Vec<LocalRecord> {
        self.records.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}
