//! In-process journal serving both protocols.

use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use parking_lot::Mutex;
use std::sync::Arc;
use tasksync_protocol::{ChangeBatch, RemoteChangeRecord, SyncMarker};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct JournalState {
    /// Current protocol change log. A sync token is an offset into it.
    items: Vec<RemoteChangeRecord>,
    /// Legacy journal entries keyed by entry uid.
    entries: Vec<(String, RemoteChangeRecord)>,
    failing_fetches: u32,
    failing_commits: u32,
    fetches: u32,
    commits: Vec<SyncMarker>,
}

impl JournalState {
    fn take_fetch_failure(&mut self) -> SyncResult<()> {
        self.fetches += 1;
        if self.failing_fetches > 0 {
            self.failing_fetches -= 1;
            return Err(SyncError::transport_retryable("injected fetch failure"));
        }
        Ok(())
    }
}

/// An in-process remote collection.
///
/// Items form a change log addressed by numeric sync tokens: fetching from
/// token `n` returns the changes after the first `n`, with repeated changes
/// to one item collapsed to the latest. Entries form a legacy journal where
/// the marker is the uid of the last entry returned.
///
/// Clones share the same journal.
///
/// # Example
///
/// ```rust
/// use tasksync_engine::{MemoryJournal, SyncTransport};
/// use tasksync_protocol::RemoteChangeRecord;
///
/// let journal = MemoryJournal::new();
/// journal.push_item(RemoteChangeRecord::item("t1", "e1", Vec::new(), true));
///
/// let batch = journal.fetch_items("tasks", None, 10).unwrap();
/// assert_eq!(batch.len(), 1);
/// assert_eq!(batch.marker.unwrap().as_str(), "1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    inner: Arc<Mutex<JournalState>>,
}

impl MemoryJournal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item change and returns the sync token that includes it.
    pub fn push_item(&self, record: RemoteChangeRecord) -> SyncMarker {
        let mut state = self.inner.lock();
        state.items.push(record);
        SyncMarker::new(state.items.len().to_string())
    }

    /// Appends a journal entry under a fresh uid and returns that uid.
    pub fn push_entry(&self, record: RemoteChangeRecord) -> String {
        let uid = Uuid::new_v4().to_string();
        self.push_entry_as(uid.clone(), record);
        uid
    }

    /// Appends a journal entry under the given uid.
    pub fn push_entry_as(&self, uid: impl Into<String>, record: RemoteChangeRecord) {
        self.inner.lock().entries.push((uid.into(), record));
    }

    /// Makes the next `count` fetches fail with a retryable error.
    pub fn fail_next_fetches(&self, count: u32) {
        self.inner.lock().failing_fetches = count;
    }

    /// Makes the next `count` marker commits fail with a retryable error.
    pub fn fail_next_commits(&self, count: u32) {
        self.inner.lock().failing_commits = count;
    }

    /// Returns the number of fetch calls, including failed ones.
    pub fn fetch_count(&self) -> u32 {
        self.inner.lock().fetches
    }

    /// Returns every marker committed so far.
    pub fn committed_markers(&self) -> Vec<SyncMarker> {
        self.inner.lock().commits.clone()
    }

    /// Returns the number of item changes in the log.
    pub fn item_count(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Returns the number of legacy entries.
    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

impl SyncTransport for MemoryJournal {
    fn fetch_items(
        &self,
        collection: &str,
        since: Option<&SyncMarker>,
        limit: u32,
    ) -> SyncResult<ChangeBatch> {
        let mut state = self.inner.lock();
        state.take_fetch_failure()?;

        let start = match since {
            None => 0,
            Some(marker) => marker
                .as_str()
                .parse::<usize>()
                .map_err(|_| SyncError::transport_fatal(format!("invalid sync token {marker}")))?,
        };
        let total = state.items.len();
        if start > total {
            return Err(SyncError::transport_fatal(format!(
                "sync token {start} is ahead of the collection"
            )));
        }
        let end = total.min(start.saturating_add(limit as usize));

        let mut page: Vec<RemoteChangeRecord> = Vec::with_capacity(end - start);
        for record in &state.items[start..end] {
            // Items without an identity are resolved by payload uid later, so never merge them.
            if let Some(id) = record.identity() {
                if let Some(pos) = page.iter().position(|r| r.identity() == Some(id)) {
                    page.remove(pos);
                }
            }
            page.push(record.clone());
        }

        debug!(collection, start, end, records = page.len(), "served items");
        Ok(ChangeBatch::new(
            page,
            Some(SyncMarker::new(end.to_string())),
            end < total,
        ))
    }

    fn fetch_entries(
        &self,
        journal: &str,
        since: Option<&SyncMarker>,
        limit: u32,
    ) -> SyncResult<ChangeBatch> {
        let mut state = self.inner.lock();
        state.take_fetch_failure()?;

        let start = match since {
            None => 0,
            Some(marker) => state
                .entries
                .iter()
                .position(|(uid, _)| uid == marker.as_str())
                .map(|pos| pos + 1)
                .ok_or_else(|| {
                    SyncError::transport_fatal(format!("unknown journal entry {marker}"))
                })?,
        };
        let total = state.entries.len();
        let end = total.min(start.saturating_add(limit as usize));

        let page = &state.entries[start..end];
        let marker = match page.last() {
            Some((uid, _)) => Some(SyncMarker::new(uid.clone())),
            None => since.cloned(),
        };
        let records = page.iter().map(|(_, record)| record.clone()).collect::<Vec<_>>();

        debug!(journal, start, end, records = records.len(), "served entries");
        Ok(ChangeBatch::new(records, marker, end < total))
    }

    fn commit_marker(&self, _collection: &str, marker: &SyncMarker) -> SyncResult<()> {
        let mut state = self.inner.lock();
        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            return Err(SyncError::transport_retryable("injected commit failure"));
        }
        state.commits.push(marker.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasksync_protocol::SyncAction;

    fn item(id: &str, etag: &str) -> RemoteChangeRecord {
        RemoteChangeRecord::item(id, etag, etag.as_bytes().to_vec(), false)
    }

    #[test]
    fn items_are_paged_by_token() {
        let journal = MemoryJournal::new();
        for i in 0..5 {
            journal.push_item(item(&format!("t{i}"), "e1"));
        }

        let first = journal.fetch_items("c", None, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.has_more);

        let marker = first.marker.unwrap();
        assert_eq!(marker.as_str(), "2");

        let rest = journal.fetch_items("c", Some(&marker), 10).unwrap();
        assert_eq!(rest.len(), 3);
        assert!(!rest.has_more);
        assert_eq!(rest.marker.unwrap().as_str(), "5");
    }

    #[test]
    fn repeated_item_changes_collapse() {
        let journal = MemoryJournal::new();
        journal.push_item(item("t1", "e1"));
        journal.push_item(item("t2", "e1"));
        journal.push_item(item("t1", "e2"));

        let batch = journal.fetch_items("c", None, 10).unwrap();
        let etags: Vec<_> = batch
            .records
            .iter()
            .map(|r| (r.external_id.clone().unwrap(), r.etag.clone().unwrap()))
            .collect();
        assert_eq!(
            etags,
            vec![("t2".to_string(), "e1".to_string()), ("t1".to_string(), "e2".to_string())]
        );
    }

    #[test]
    fn items_without_identity_are_kept() {
        let journal = MemoryJournal::new();
        for body in ["a", "b", "c"] {
            journal.push_item(RemoteChangeRecord {
                external_id: None,
                etag: None,
                payload: body.as_bytes().to_vec(),
                is_deletion: false,
                action: None,
            });
        }
        journal.push_item(RemoteChangeRecord::item("", "e1", b"d".to_vec(), false));

        let batch = journal.fetch_items("c", None, 10).unwrap();
        let payloads: Vec<_> = batch.records.iter().map(|r| r.payload.clone()).collect();
        assert_eq!(payloads, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
    }

    #[test]
    fn bad_token_is_fatal() {
        let journal = MemoryJournal::new();
        let err = journal
            .fetch_items("c", Some(&SyncMarker::new("nope")), 10)
            .unwrap_err();
        assert!(!err.is_retryable());

        let err = journal
            .fetch_items("c", Some(&SyncMarker::new("3")), 10)
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn entries_resume_after_marker() {
        let journal = MemoryJournal::new();
        journal.push_entry_as("u1", RemoteChangeRecord::entry(SyncAction::Add, b"a".to_vec()));
        journal.push_entry_as("u2", RemoteChangeRecord::entry(SyncAction::Change, b"b".to_vec()));
        journal.push_entry_as("u3", RemoteChangeRecord::entry(SyncAction::Delete, b"c".to_vec()));

        let first = journal.fetch_entries("j", None, 2).unwrap();
        assert_eq!(first.marker.as_ref().unwrap().as_str(), "u2");
        assert!(first.has_more);

        let rest = journal.fetch_entries("j", first.marker.as_ref(), 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest.records[0].action, Some(SyncAction::Delete));
        assert_eq!(rest.marker.as_ref().unwrap().as_str(), "u3");

        let empty = journal.fetch_entries("j", rest.marker.as_ref(), 2).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.marker.unwrap().as_str(), "u3");
    }

    #[test]
    fn generated_entry_uids_are_unique() {
        let journal = MemoryJournal::new();
        let a = journal.push_entry(RemoteChangeRecord::entry(SyncAction::Add, Vec::new()));
        let b = journal.push_entry(RemoteChangeRecord::entry(SyncAction::Add, Vec::new()));
        assert_ne!(a, b);
        assert_eq!(journal.entry_count(), 2);
    }

    #[test]
    fn injected_failures() {
        let journal = MemoryJournal::new();
        journal.fail_next_fetches(1);
        journal.fail_next_commits(1);

        assert!(journal.fetch_items("c", None, 1).unwrap_err().is_retryable());
        assert!(journal.fetch_items("c", None, 1).is_ok());
        assert_eq!(journal.fetch_count(), 2);

        let marker = SyncMarker::new("0");
        assert!(journal.commit_marker("c", &marker).is_err());
        journal.commit_marker("c", &marker).unwrap();
        assert_eq!(journal.committed_markers(), vec![marker]);
    }
}
