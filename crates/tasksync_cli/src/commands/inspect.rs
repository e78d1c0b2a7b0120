//! Inspect command implementation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tasksync_engine::{ContactDomain, SyncDomain, TaskDomain, KIND_CONTACT, KIND_GROUP, KIND_TASK};
use tasksync_store::{FileStore, LocalRecord, LocalStore};

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Last committed sync marker.
    pub marker: Option<String>,
    /// Number of records.
    pub record_count: usize,
    /// Number of records per kind.
    pub kinds: BTreeMap<String, usize>,
    /// Every record, ordered by row identity.
    pub records: Vec<RecordInfo>,
}

/// Summary of a single local record.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Row identity.
    pub id: u64,
    /// External identity.
    pub file_name: Option<String>,
    /// Domain UID.
    pub uid: String,
    /// Version marker.
    pub etag: Option<String>,
    /// Kind tag.
    pub kind: String,
    /// Task summary or contact name, if the body decodes.
    pub title: Option<String>,
    /// Body size in bytes.
    pub body_size: usize,
}

impl RecordInfo {
    fn from_record(record: &LocalRecord) -> Self {
        Self {
            id: record.id.as_u64(),
            file_name: record.file_name.clone(),
            uid: record.uid.clone(),
            etag: record.etag.clone(),
            kind: record.kind.clone(),
            title: title_of(record),
            body_size: record.body.len(),
        }
    }
}

fn title_of(record: &LocalRecord) -> Option<String> {
    match record.kind.as_str() {
        KIND_TASK => TaskDomain::decode_body(&record.body).ok()?.summary,
        KIND_CONTACT | KIND_GROUP => ContactDomain::decode_body(&record.body).ok()?.formatted_name,
        _ => None,
    }
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.join("store.cbor").exists() {
        return Err(format!("No store found at {:?}", path).into());
    }

    let store = FileStore::open(path)?;
    let records = store.records()?;

    let mut kinds = BTreeMap::new();
    for record in &records {
        *kinds.entry(record.kind.clone()).or_insert(0) += 1;
    }

    let result = InspectResult {
        path: path.display().to_string(),
        marker: store.sync_marker()?,
        record_count: records.len(),
        kinds,
        records: records.iter().map(RecordInfo::from_record).collect(),
    };

    // Output
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("tasksync Store Inspection");
    println!("=========================");
    println!();
    println!("Path:    {}", result.path);
    println!("Marker:  {}", result.marker.as_deref().unwrap_or("(none)"));
    println!("Records: {}", result.record_count);

    if !result.kinds.is_empty() {
        println!();
        println!("Kinds:");
        for (kind, count) in &result.kinds {
            println!("  {kind}: {count}");
        }
    }

    if !result.records.is_empty() {
        println!();
        println!("Records:");
        for record in &result.records {
            println!(
                "  [#{}] {} ({}) etag={} {}",
                record.id,
                record.file_name.as_deref().unwrap_or(&record.uid),
                record.kind,
                record.etag.as_deref().unwrap_or("-"),
                record.title.as_deref().unwrap_or(""),
            );
        }
    }
}
