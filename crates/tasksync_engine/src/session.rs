//! Sync session state machine.

use crate::config::{NetworkState, SyncConfig};
use crate::domain::SyncDomain;
use crate::error::{SessionFailure, SyncError, SyncResult};
use crate::observer::{SyncEvent, SyncObserver, TracingObserver};
use crate::reconcile::{Reconciler, SyncCounters};
use crate::transport::SyncTransport;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tasksync_protocol::{select_mode, ChangeBatch, CollectionDescriptor, ProtocolMode, SyncMarker};
use tasksync_store::LocalStore;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// The state of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// No session is running.
    Idle,
    /// Selecting the protocol and reading the stored marker.
    Preparing,
    /// Fetching a batch from the transport.
    Fetching,
    /// Applying a batch to the local store.
    Reconciling,
    /// Committing the batch marker.
    Committing,
    /// The last session completed.
    Done,
    /// The last session failed.
    Failed,
}

impl SessionState {
    /// Returns true while a session is running.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Preparing
                | SessionState::Fetching
                | SessionState::Reconciling
                | SessionState::Committing
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Preparing => "preparing",
            SessionState::Fetching => "fetching",
            SessionState::Reconciling => "reconciling",
            SessionState::Committing => "committing",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a completed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Collection URL.
    pub collection: String,
    /// Protocol used for the whole session.
    pub mode: ProtocolMode,
    /// Mutation counters.
    pub counters: SyncCounters,
    /// Marker committed last, or the stored one if nothing advanced.
    pub marker: Option<SyncMarker>,
    /// Number of batches fetched.
    pub batches: u32,
    /// Wall time of the session.
    pub duration: Duration,
}

/// Aborts a running session from another thread.
///
/// Cancellation is checked before each fetch and before each record.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Runs sync sessions for one collection.
///
/// The manager owns its store for its whole lifetime, so exactly one
/// session mutates the collection at a time. Distinct collections use
/// distinct managers, which may run on distinct threads.
///
/// # Example
///
/// ```rust
/// use tasksync_engine::{MemoryJournal, SyncConfig, SyncManager, TaskDomain};
/// use tasksync_protocol::{CollectionDescriptor, CollectionKind};
/// use tasksync_store::MemoryStore;
///
/// let descriptor = CollectionDescriptor::current("/tasks/", CollectionKind::Tasks, "col-1");
/// let mut manager = SyncManager::<TaskDomain, _, _>::new(
///     SyncConfig::default(),
///     descriptor,
///     MemoryJournal::new(),
///     MemoryStore::new(),
/// );
///
/// let report = manager.sync().unwrap();
/// assert_eq!(report.counters.total(), 0);
/// ```
pub struct SyncManager<D: SyncDomain, T: SyncTransport, S: LocalStore> {
    config: SyncConfig,
    descriptor: CollectionDescriptor,
    transport: T,
    store: S,
    observer: Arc<dyn SyncObserver>,
    state: SessionState,
    cancelled: Arc<AtomicBool>,
    _domain: PhantomData<fn() -> D>,
}

impl<D: SyncDomain, T: SyncTransport, S: LocalStore> SyncManager<D, T, S> {
    /// Creates a manager that logs through [`TracingObserver`].
    pub fn new(config: SyncConfig, descriptor: CollectionDescriptor, transport: T, store: S) -> Self {
        Self {
            config,
            descriptor,
            transport,
            store,
            observer: Arc::new(TracingObserver),
            state: SessionState::Idle,
            cancelled: Arc::new(AtomicBool::new(false)),
            _domain: PhantomData,
        }
    }

    /// Replaces the observer.
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Gets the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gets the collection descriptor.
    pub fn descriptor(&self) -> &CollectionDescriptor {
        &self.descriptor
    }

    /// Gets the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Gets the local store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gets the local store mutably, between sessions.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consumes the manager and returns its transport and store.
    pub fn into_parts(self) -> (T, S) {
        (self.transport, self.store)
    }

    /// Returns a handle that cancels the running or next session.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn set_state(&mut self, state: SessionState) {
        debug!(from = %self.state, to = %state, "session state");
        self.state = state;
    }

    /// Runs one session: fetch and apply batches until the feed is drained.
    ///
    /// Records applied before a failure stay applied. The marker of the
    /// failing batch is not committed, so the next session re-fetches it;
    /// re-applying records is idempotent.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionFailure`] carrying the failing stage and the number
    /// of records reconciled before the failure.
    pub fn sync(&mut self) -> Result<SessionReport, SessionFailure> {
        let start = Instant::now();
        let span = info_span!(
            "sync_session",
            session = %Uuid::new_v4(),
            collection = %self.descriptor.url
        );
        let _enter = span.enter();

        let mut applied = 0u64;
        let result = self.run(&mut applied);

        let outcome = match result {
            Ok(mut report) => {
                report.duration = start.elapsed();
                self.set_state(SessionState::Done);
                self.observer.on_session_finished(&report);
                Ok(report)
            }
            Err(error) => {
                let failure = SessionFailure {
                    collection: self.descriptor.url.clone(),
                    stage: self.state,
                    error,
                    applied,
                };
                self.set_state(SessionState::Failed);
                self.observer.on_record(
                    &self.descriptor.url,
                    &SyncEvent::Failed(failure.error.to_string()),
                );
                self.observer.on_session_failed(&failure);
                Err(failure)
            }
        };

        // A cancel request only applies to the session it interrupted
        self.cancelled.store(false, Ordering::SeqCst);
        outcome
    }

    /// Runs a session, retrying retryable failures with backoff.
    ///
    /// # Errors
    ///
    /// Returns the last failure once it is not retryable or the attempts
    /// are exhausted.
    pub fn sync_with_retry(&mut self) -> Result<SessionReport, SessionFailure> {
        let retry = self.config.retry.clone();
        let attempts = retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.sync() {
                Ok(report) => return Ok(report),
                Err(failure) => {
                    attempt += 1;
                    if !failure.is_retryable() || attempt >= attempts {
                        return Err(failure);
                    }
                    let delay = retry.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        delay = ?delay,
                        error = %failure.error,
                        "Sync failed, retrying"
                    );
                    std::thread::sleep(delay);
                }
            }
        }
    }

    /// Runs a session if the network satisfies the configured conditions.
    ///
    /// Returns `Ok(None)` when the session was skipped.
    ///
    /// # Errors
    ///
    /// Returns the failure of the session if it ran and failed.
    pub fn sync_if_permitted(
        &mut self,
        network: &NetworkState,
    ) -> Result<Option<SessionReport>, SessionFailure> {
        if !self.config.permits(network) {
            info!(
                collection = %self.descriptor.url,
                wifi_only = self.config.wifi_only,
                ssid = ?network.ssid,
                "Sync conditions not met, skipping"
            );
            return Ok(None);
        }
        self.sync().map(Some)
    }

    fn run(&mut self, applied: &mut u64) -> SyncResult<SessionReport> {
        self.set_state(SessionState::Preparing);
        let (mode, remote) = self.prepare()?;
        let mut marker = self.store.sync_marker()?.map(SyncMarker::new);
        debug!(?mode, remote = %remote, marker = ?marker, "prepared session");

        let mut reconciler = Reconciler::<D>::new(mode);
        let mut batches = 0u32;

        loop {
            self.check_cancelled()?;

            self.set_state(SessionState::Fetching);
            let batch = self.fetch(mode, &remote, marker.as_ref())?;
            batches += 1;

            self.set_state(SessionState::Reconciling);
            for record in &batch.records {
                self.check_cancelled()?;
                let mutation = reconciler.apply_change(record, &mut self.store)?;
                *applied += 1;
                self.observer
                    .on_record(&self.descriptor.url, &SyncEvent::from(mutation));
            }

            if let Some(next) = batch.marker {
                self.set_state(SessionState::Committing);
                self.transport.commit_marker(&remote, &next)?;
                self.store.set_sync_marker(next.as_str())?;
                marker = Some(next);
            }

            if !batch.has_more {
                break;
            }
        }

        Ok(SessionReport {
            collection: self.descriptor.url.clone(),
            mode,
            counters: *reconciler.counters(),
            marker,
            batches,
            duration: Duration::ZERO,
        })
    }

    /// Selects the protocol once for the whole session.
    fn prepare(&self) -> SyncResult<(ProtocolMode, String)> {
        if self.descriptor.kind != D::KIND {
            return Err(SyncError::Configuration(format!(
                "collection {} holds {}, session syncs {}",
                self.descriptor.url,
                self.descriptor.kind,
                D::KIND
            )));
        }

        let mode = select_mode(&self.descriptor)?;
        let remote = match mode {
            ProtocolMode::Current => self.descriptor.collection_handle.clone(),
            ProtocolMode::Legacy => self.descriptor.legacy_journal.clone(),
        }
        .unwrap_or_default();
        Ok((mode, remote))
    }

    fn fetch(
        &self,
        mode: ProtocolMode,
        remote: &str,
        since: Option<&SyncMarker>,
    ) -> SyncResult<ChangeBatch> {
        let limit = self.config.fetch_batch_size;
        let batch = match mode {
            ProtocolMode::Current => self.transport.fetch_items(remote, since, limit)?,
            ProtocolMode::Legacy => self.transport.fetch_entries(remote, since, limit)?,
        };
        debug!(records = batch.len(), has_more = batch.has_more, "fetched batch");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::domain::TaskDomain;
    use crate::journal::MemoryJournal;
    use crate::observer::RecordingObserver;
    use tasksync_protocol::{CollectionKind, RemoteChangeRecord, SyncAction};
    use tasksync_store::MemoryStore;

    fn vtodo(uid: &str) -> Vec<u8> {
        format!("BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:{uid}\r\nEND:VTODO\r\nEND:VCALENDAR\r\n")
            .into_bytes()
    }

    fn manager(
        descriptor: CollectionDescriptor,
        journal: &MemoryJournal,
        store: &MemoryStore,
    ) -> SyncManager<TaskDomain, MemoryJournal, MemoryStore> {
        SyncManager::new(
            SyncConfig::new().with_retry(RetryConfig::no_retry()),
            descriptor,
            journal.clone(),
            store.clone(),
        )
    }

    fn current() -> CollectionDescriptor {
        CollectionDescriptor::current("/tasks/", CollectionKind::Tasks, "col-1")
    }

    #[test]
    fn initial_state() {
        let m = manager(current(), &MemoryJournal::new(), &MemoryStore::new());
        assert_eq!(m.state(), SessionState::Idle);
        assert!(!m.state().is_active());
    }

    #[test]
    fn empty_session_completes() {
        let journal = MemoryJournal::new();
        let store = MemoryStore::new();
        let mut m = manager(current(), &journal, &store);

        let report = m.sync().unwrap();
        assert_eq!(m.state(), SessionState::Done);
        assert_eq!(report.mode, ProtocolMode::Current);
        assert_eq!(report.batches, 1);
        assert_eq!(store.sync_marker().unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn batches_until_drained() {
        let journal = MemoryJournal::new();
        for i in 0..5 {
            journal.push_item(RemoteChangeRecord::item(format!("t{i}"), "e1", vtodo(&format!("t{i}")), false));
        }
        let store = MemoryStore::new();
        let mut m = SyncManager::<TaskDomain, _, _>::new(
            SyncConfig::new().with_fetch_batch_size(2),
            current(),
            journal.clone(),
            store.clone(),
        );

        let report = m.sync().unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(report.counters.inserts, 5);
        assert_eq!(journal.committed_markers().len(), 3);
        assert_eq!(store.sync_marker().unwrap().as_deref(), Some("5"));
    }

    #[test]
    fn missing_protocol_fails_preparing() {
        let mut descriptor = current();
        descriptor.collection_handle = None;
        let mut m = manager(descriptor, &MemoryJournal::new(), &MemoryStore::new());

        let failure = m.sync().unwrap_err();
        assert_eq!(failure.stage, SessionState::Preparing);
        assert!(matches!(failure.error, SyncError::ProtocolMismatch(_)));
        assert_eq!(m.state(), SessionState::Failed);
    }

    #[test]
    fn wrong_kind_fails_preparing() {
        let descriptor = CollectionDescriptor::current("/contacts/", CollectionKind::AddressBook, "c");
        let mut m = manager(descriptor, &MemoryJournal::new(), &MemoryStore::new());

        let failure = m.sync().unwrap_err();
        assert!(matches!(failure.error, SyncError::Configuration(_)));
        assert_eq!(failure.stage, SessionState::Preparing);
    }

    #[test]
    fn cancel_before_sync() {
        let journal = MemoryJournal::new();
        journal.push_entry(RemoteChangeRecord::entry(SyncAction::Add, vtodo("a")));
        let store = MemoryStore::new();
        let descriptor = CollectionDescriptor::legacy("/tasks/", CollectionKind::Tasks, "journal-1");
        let mut m = manager(descriptor, &journal, &store);

        let handle = m.cancel_handle();
        handle.cancel();
        assert!(handle.is_cancelled());

        let failure = m.sync().unwrap_err();
        assert!(matches!(failure.error, SyncError::Cancelled));
        assert_eq!(failure.applied, 0);
        assert!(store.sync_marker().unwrap().is_none());

        // The flag is consumed by the cancelled session
        assert!(!handle.is_cancelled());
        assert_eq!(m.sync().unwrap().counters.inserts, 1);
    }

    #[test]
    fn observer_sees_failure() {
        let journal = MemoryJournal::new();
        journal.fail_next_fetches(1);
        let recorder = Arc::new(RecordingObserver::new());
        let mut m = manager(current(), &journal, &MemoryStore::new())
            .with_observer(recorder.clone());

        let failure = m.sync().unwrap_err();
        assert_eq!(failure.stage, SessionState::Fetching);
        assert!(failure.is_retryable());
        assert_eq!(recorder.failures().len(), 1);
        assert!(matches!(recorder.events().last(), Some(SyncEvent::Failed(_))));
    }

    #[test]
    fn skipped_when_conditions_not_met() {
        let journal = MemoryJournal::new();
        let mut m = SyncManager::<TaskDomain, _, _>::new(
            SyncConfig::new().with_wifi_only(None),
            current(),
            journal.clone(),
            MemoryStore::new(),
        );

        assert!(m.sync_if_permitted(&NetworkState::cellular()).unwrap().is_none());
        assert_eq!(journal.fetch_count(), 0);
        assert_eq!(m.state(), SessionState::Idle);

        assert!(m.sync_if_permitted(&NetworkState::wifi(None)).unwrap().is_some());
    }
}
