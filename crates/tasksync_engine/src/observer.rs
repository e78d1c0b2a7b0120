//! Session observers.

use crate::error::SessionFailure;
use crate::reconcile::{AppliedMutation, NoOpReason};
use crate::session::SessionReport;
use parking_lot::Mutex;
use tasksync_store::LocalId;
use tracing::{error, info};

/// Something that happened to one record during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A local record was created.
    Inserted(LocalId),
    /// A local record was overwritten.
    Updated(LocalId),
    /// A local record was deleted.
    Removed(LocalId),
    /// A record changed nothing.
    NoOp(NoOpReason),
    /// A record ended the session.
    Failed(String),
}

impl From<AppliedMutation> for SyncEvent {
    fn from(mutation: AppliedMutation) -> Self {
        match mutation {
            AppliedMutation::Inserted(id) => SyncEvent::Inserted(id),
            AppliedMutation::Updated(id) => SyncEvent::Updated(id),
            AppliedMutation::Removed(id) => SyncEvent::Removed(id),
            AppliedMutation::NoOp(reason) => SyncEvent::NoOp(reason),
        }
    }
}

/// Receives session notifications.
///
/// Observers are shared as `Arc<dyn SyncObserver>` and must not block:
/// they run inline on the session thread.
pub trait SyncObserver: Send + Sync {
    /// Called after each record is reconciled, or when one fails.
    fn on_record(&self, _collection: &str, _event: &SyncEvent) {}

    /// Called when a session completes.
    fn on_session_finished(&self, _report: &SessionReport) {}

    /// Called when a session fails.
    fn on_session_failed(&self, _failure: &SessionFailure) {}
}

/// Logs session outcomes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_session_finished(&self, report: &SessionReport) {
        info!(
            inserts = report.counters.inserts,
            updates = report.counters.updates,
            deletes = report.counters.deletes,
            skipped = report.counters.skipped,
            batches = report.batches,
            "Sync of {} finished",
            report.collection
        );
    }

    fn on_session_failed(&self, failure: &SessionFailure) {
        error!(
            stage = %failure.stage,
            applied = failure.applied,
            retryable = failure.is_retryable(),
            "Sync of {} failed: {}",
            failure.collection,
            failure.error
        );
    }
}

/// Keeps every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SyncEvent>>,
    finished: Mutex<Vec<SessionReport>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record events seen so far.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().clone()
    }

    /// Returns the reports of finished sessions.
    pub fn finished(&self) -> Vec<SessionReport> {
        self.finished.lock().clone()
    }

    /// Returns the messages of failed sessions.
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_record(&self, _collection: &str, event: &SyncEvent) {
        self.events.lock().push(event.clone());
    }

    fn on_session_finished(&self, report: &SessionReport) {
        self.finished.lock().push(report.clone());
    }

    fn on_session_failed(&self, failure: &SessionFailure) {
        self.failures.lock().push(failure.to_string());
    }
}
