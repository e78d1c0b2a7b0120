//! File-backed store for persistent collections.

use crate::error::{StoreError, StoreResult};
use crate::record::{LocalId, LocalRecord, NewRecord, RecordUpdate};
use crate::state::CollectionState;
use crate::store::LocalStore;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const SNAPSHOT_FILE: &str = "store.cbor";
const SNAPSHOT_TMP_FILE: &str = "store.cbor.tmp";
const LOCK_FILE: &str = "LOCK";

/// A durable local store.
///
/// The whole collection is kept in memory and written as a CBOR snapshot to
/// `<dir>/store.cbor` after every mutation. Snapshots are written to a
/// temporary file, synced and renamed over the previous snapshot, so a crash
/// leaves either the old or the new state on disk.
///
/// An open store holds an exclusive lock on `<dir>/LOCK` until it is dropped,
/// so two handles never write the same directory.
///
/// # Example
///
/// ```no_run
/// use tasksync_store::{FileStore, LocalStore};
/// use std::path::Path;
///
/// let mut store = FileStore::open(Path::new("tasks.d")).unwrap();
/// store.set_sync_marker("stoken-1").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    state: CollectionState,
    /// Released when the file is closed.
    _lock_file: File,
}

impl FileStore {
    /// Opens the store in `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, if another
    /// handle already holds it ([`StoreError::Locked`]), or if the existing
    /// snapshot cannot be read.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked(dir.to_path_buf()));
        }

        let snapshot = dir.join(SNAPSHOT_FILE);
        let state: CollectionState = if snapshot.exists() {
            let reader = BufReader::new(File::open(&snapshot)?);
            ciborium::from_reader(reader).map_err(|e| StoreError::Corrupted(e.to_string()))?
        } else {
            CollectionState::default()
        };

        debug!(dir = %dir.display(), records = state.len(), "opened file store");

        Ok(Self {
            dir: dir.to_path_buf(),
            state,
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `next` to disk and makes it the current state.
    fn commit(&mut self, next: CollectionState) -> StoreResult<()> {
        let mut bytes = Vec::new();
        ciborium::into_writer(&next, &mut bytes).map_err(|e| StoreError::Encoding(e.to_string()))?;

        let tmp = self.dir.join(SNAPSHOT_TMP_FILE);
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, self.dir.join(SNAPSHOT_FILE))?;

        self.state = next;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn find_by_file_name(&self, file_name: &str) -> StoreResult<Option<LocalRecord>> {
        Ok(self.state.find_by_file_name(file_name))
    }

    fn find_by_uid(&self, uid: &str) -> StoreResult<Option<LocalRecord>> {
        Ok(self.state.find_by_uid(uid))
    }

    fn get(&self, id: LocalId) -> StoreResult<Option<LocalRecord>> {
        Ok(self.state.get(id))
    }

    fn insert(&mut self, record: NewRecord) -> StoreResult<LocalId> {
        let mut next = self.state.clone();
        let id = next.insert(record);
        self.commit(next)?;
        Ok(id)
    }

    fn update(&mut self, id: LocalId, update: RecordUpdate) -> StoreResult<()> {
        let mut next = self.state.clone();
        next.update(id, update)?;
        self.commit(next)
    }

    fn delete(&mut self, id: LocalId) -> StoreResult<()> {
        if !self.state.contains(id) {
            return Ok(());
        }
        let mut next = self.state.clone();
        next.delete(id);
        self.commit(next)
    }

    fn sync_marker(&self) -> StoreResult<Option<String>> {
        Ok(self.state.sync_marker())
    }

    fn set_sync_marker(&mut self, marker: &str) -> StoreResult<()> {
        let mut next = self.state.clone();
        next.set_sync_marker(marker);
        self.commit(next)
    }

    fn records(&self) -> StoreResult<Vec<LocalRecord>> {
        Ok(self.state.records())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.state.len())
    }
}
