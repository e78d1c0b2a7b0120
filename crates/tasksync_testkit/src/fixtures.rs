//! Test fixtures: payload builders, remote records and scratch stores.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use tasksync_protocol::{RemoteChangeRecord, SyncAction};
use tasksync_store::FileStore;
use tempfile::TempDir;

/// Builds a VCALENDAR holding one VTODO.
pub fn vtodo(uid: &str, summary: &str) -> Vec<u8> {
    vtodos(&[(uid, summary)])
}

/// Builds a VCALENDAR holding one VTODO per `(uid, summary)` pair.
pub fn vtodos(tasks: &[(&str, &str)]) -> Vec<u8> {
    let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//tasksync//testkit//EN\r\n");
    for (uid, summary) in tasks {
        out.push_str("BEGIN:VTODO\r\n");
        out.push_str(&format!("UID:{uid}\r\n"));
        out.push_str(&format!("SUMMARY:{summary}\r\n"));
        out.push_str("STATUS:NEEDS-ACTION\r\n");
        out.push_str("END:VTODO\r\n");
    }
    out.push_str("END:VCALENDAR\r\n");
    out.into_bytes()
}

/// Builds a VCALENDAR without any VTODO.
pub fn empty_vcalendar() -> Vec<u8> {
    vtodos(&[])
}

/// Builds a vCard 4 contact.
pub fn vcard(uid: &str, name: &str) -> Vec<u8> {
    format!("BEGIN:VCARD\r\nVERSION:4.0\r\nUID:{uid}\r\nFN:{name}\r\nEND:VCARD\r\n").into_bytes()
}

/// Builds a vCard 4 group with the given member UIDs.
pub fn vcard_group(uid: &str, name: &str, members: &[&str]) -> Vec<u8> {
    let mut out = format!("BEGIN:VCARD\r\nVERSION:4.0\r\nUID:{uid}\r\nKIND:group\r\nFN:{name}\r\n");
    for member in members {
        out.push_str(&format!("MEMBER:urn:uuid:{member}\r\n"));
    }
    out.push_str("END:VCARD\r\n");
    out.into_bytes()
}

/// A current-protocol upsert.
pub fn item(uid: &str, etag: &str, payload: Vec<u8>) -> RemoteChangeRecord {
    RemoteChangeRecord::item(uid, etag, payload, false)
}

/// A current-protocol deletion.
pub fn deleted_item(uid: &str, etag: &str) -> RemoteChangeRecord {
    RemoteChangeRecord::item(uid, etag, Vec::new(), true)
}

/// A legacy journal entry.
pub fn entry(action: SyncAction, payload: Vec<u8>) -> RemoteChangeRecord {
    RemoteChangeRecord::entry(action, payload)
}

/// A file store in a temporary directory, removed on drop.
pub struct TestStore {
    store: FileStore,
    temp_dir: TempDir,
}

impl TestStore {
    /// Opens a store in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(temp_dir.path()).expect("Failed to open file store");
        Self { store, temp_dir }
    }

    /// Drops the open handle and opens the directory again.
    pub fn reopen(self) -> Self {
        let Self { store, temp_dir } = self;
        drop(store);
        let store = FileStore::open(temp_dir.path()).expect("Failed to reopen file store");
        Self { store, temp_dir }
    }

    /// Returns the store directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Takes the store, keeping the directory alive in the returned guard.
    pub fn into_parts(self) -> (FileStore, TempDir) {
        (self.store, self.temp_dir)
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestStore {
    type Target = FileStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl DerefMut for TestStore {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}
