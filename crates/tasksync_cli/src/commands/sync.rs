//! Sync command implementation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tasksync_engine::{
    ContactDomain, MemoryJournal, RetryConfig, SessionReport, SyncConfig, SyncDomain, SyncManager,
    TaskDomain,
};
use tasksync_protocol::{CollectionDescriptor, ProtocolMode, RemoteChangeRecord, SyncAction};
use tasksync_store::FileStore;
use tracing::info;

/// Options for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Record domain (tasks, contacts).
    pub domain: String,
    /// Records fetched per batch.
    pub batch_size: u32,
    /// Attempts for retryable failures.
    pub attempts: u32,
    /// Output format (text, json).
    pub format: String,
}

/// A journal file: one collection and its remote changes.
///
/// ```json
/// {
///   "collection": { "url": "/tasks/", "display_name": null, "kind": "Tasks",
///                   "collection_handle": "col-1", "legacy_journal": null },
///   "items": [ { "uid": "t1", "etag": "e1", "content": "BEGIN:VCALENDAR..." } ],
///   "entries": [ { "action": "ADD", "content": "BEGIN:VCALENDAR..." } ]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct JournalFile {
    /// Collection metadata.
    pub collection: CollectionDescriptor,
    /// Current-protocol change log, oldest first.
    #[serde(default)]
    pub items: Vec<ItemSpec>,
    /// Legacy journal entries, oldest first.
    #[serde(default)]
    pub entries: Vec<EntrySpec>,
}

/// One current-protocol change.
#[derive(Debug, Deserialize)]
pub struct ItemSpec {
    /// Item UID (external identity).
    pub uid: String,
    /// Version marker.
    #[serde(default)]
    pub etag: Option<String>,
    /// iCalendar or vCard text.
    #[serde(default)]
    pub content: String,
    /// True if the item was deleted.
    #[serde(default)]
    pub deleted: bool,
}

/// One legacy journal entry.
#[derive(Debug, Deserialize)]
pub struct EntrySpec {
    /// Entry UID. Defaults to `entry-<index>`.
    #[serde(default)]
    pub uid: Option<String>,
    /// Action tag (ADD, CHANGE, DELETE).
    pub action: SyncAction,
    /// iCalendar or vCard text.
    #[serde(default)]
    pub content: String,
}

impl JournalFile {
    /// Reads a journal file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read journal {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Loads the changes into an in-process journal.
    pub fn into_journal(self) -> (CollectionDescriptor, MemoryJournal) {
        let journal = MemoryJournal::new();

        for item in self.items {
            journal.push_item(RemoteChangeRecord {
                external_id: Some(item.uid),
                etag: item.etag,
                payload: item.content.into_bytes(),
                is_deletion: item.deleted,
                action: None,
            });
        }
        for (index, entry) in self.entries.into_iter().enumerate() {
            let uid = entry.uid.unwrap_or_else(|| format!("entry-{index}"));
            journal.push_entry_as(uid, RemoteChangeRecord::entry(entry.action, entry.content));
        }

        (self.collection, journal)
    }
}

/// Printable summary of a session.
#[derive(Debug, Serialize)]
pub struct SyncOutput {
    /// Store directory.
    pub store: String,
    /// Session report.
    #[serde(flatten)]
    pub report: SessionReport,
}

/// Runs the sync command.
pub fn run(
    store_path: &Path,
    journal_path: &Path,
    options: &SyncOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let (descriptor, journal) = JournalFile::load(journal_path)?.into_journal();
    info!(
        journal = %journal_path.display(),
        items = journal.item_count(),
        entries = journal.entry_count(),
        "Loaded journal for {}",
        descriptor.name()
    );
    let store = FileStore::open(store_path)?;

    let config = SyncConfig::new()
        .with_fetch_batch_size(options.batch_size)
        .with_retry(RetryConfig::new(options.attempts.max(1)));

    let report = match options.domain.as_str() {
        "tasks" => run_session::<TaskDomain>(config, descriptor, journal, store)?,
        "contacts" => run_session::<ContactDomain>(config, descriptor, journal, store)?,
        other => return Err(format!("Unknown domain {other:?} (expected tasks or contacts)").into()),
    };

    let result = SyncOutput {
        store: store_path.display().to_string(),
        report,
    };

    match options.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn run_session<D: SyncDomain>(
    config: SyncConfig,
    descriptor: CollectionDescriptor,
    journal: MemoryJournal,
    store: FileStore,
) -> Result<SessionReport, Box<dyn std::error::Error>> {
    let mut manager = SyncManager::<D, _, _>::new(config, descriptor, journal, store);
    Ok(manager.sync_with_retry()?)
}

fn print_text_output(result: &SyncOutput) {
    let report = &result.report;
    let mode = match report.mode {
        ProtocolMode::Current => "current",
        ProtocolMode::Legacy => "legacy",
    };

    println!("tasksync Session");
    println!("================");
    println!();
    println!("Collection: {}", report.collection);
    println!("Store:      {}", result.store);
    println!("Protocol:   {mode}");
    println!();
    println!("Changes:");
    println!("  Inserted: {}", report.counters.inserts);
    println!("  Updated:  {}", report.counters.updates);
    println!("  Deleted:  {}", report.counters.deletes);
    println!("  Skipped:  {}", report.counters.skipped);
    println!();
    println!(
        "Marker:     {}",
        report.marker.as_ref().map_or("(none)", |m| m.as_str())
    );
    println!("Batches:    {}", report.batches);
    println!("Duration:   {:.1} ms", report.duration.as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasksync_engine::SyncTransport;

    const JOURNAL: &str = r#"{
        "collection": {
            "url": "/tasks/",
            "display_name": "Tasks",
            "kind": "Tasks",
            "collection_handle": null,
            "legacy_journal": "journal-1"
        },
        "entries": [
            { "action": "ADD", "content": "BEGIN:VCALENDAR\nBEGIN:VTODO\nUID:t1\nEND:VTODO\nEND:VCALENDAR\n" },
            { "uid": "last", "action": "DELETE", "content": "BEGIN:VCALENDAR\nBEGIN:VTODO\nUID:t1\nEND:VTODO\nEND:VCALENDAR\n" }
        ]
    }"#;

    #[test]
    fn journal_file_loads_entries() {
        let file: JournalFile = serde_json::from_str(JOURNAL).unwrap();
        let (descriptor, journal) = file.into_journal();

        assert_eq!(
            tasksync_protocol::select_mode(&descriptor).unwrap(),
            ProtocolMode::Legacy
        );
        assert_eq!(journal.entry_count(), 2);

        let batch = journal.fetch_entries("journal-1", None, 10).unwrap();
        assert_eq!(batch.records[0].action, Some(SyncAction::Add));
        assert!(batch.records[1].is_deletion);
        assert_eq!(batch.marker.unwrap().as_str(), "last");
    }

    #[test]
    fn items_default_to_live() {
        let file: JournalFile = serde_json::from_str(
            r#"{
                "collection": { "url": "/t/", "display_name": null, "kind": "Tasks",
                                "collection_handle": "c", "legacy_journal": null },
                "items": [ { "uid": "t1", "content": "" } ]
            }"#,
        )
        .unwrap();
        let (_, journal) = file.into_journal();

        let batch = journal.fetch_items("c", None, 10).unwrap();
        assert!(!batch.records[0].is_deletion);
        assert!(batch.records[0].etag.is_none());
    }
}
