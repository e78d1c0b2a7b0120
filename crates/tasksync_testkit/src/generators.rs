//! Property-based test generators using proptest.
//!
//! Identities are drawn from a small pool so that generated feeds revisit
//! the same records.

use crate::fixtures;
use proptest::prelude::*;
use tasksync_protocol::{RemoteChangeRecord, SyncAction};

/// One remote change to a task, independent of protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOp {
    /// Create or replace a task.
    Upsert {
        /// Task UID.
        uid: String,
        /// Version marker.
        etag: String,
        /// Task summary.
        summary: String,
    },
    /// Delete a task.
    Delete {
        /// Task UID.
        uid: String,
    },
}

impl TaskOp {
    /// Returns the UID the change targets.
    pub fn uid(&self) -> &str {
        match self {
            TaskOp::Upsert { uid, .. } | TaskOp::Delete { uid } => uid,
        }
    }

    /// Renders the change as a current-protocol item.
    pub fn to_item(&self) -> RemoteChangeRecord {
        match self {
            TaskOp::Upsert { uid, etag, summary } => {
                fixtures::item(uid, etag, fixtures::vtodo(uid, summary))
            }
            TaskOp::Delete { uid } => fixtures::deleted_item(uid, "deleted"),
        }
    }

    /// Renders the change as a legacy journal entry.
    ///
    /// Legacy deletions carry the full content of the deleted task.
    pub fn to_entry(&self, existed: bool) -> RemoteChangeRecord {
        match self {
            TaskOp::Upsert { uid, summary, .. } => {
                let action = if existed { SyncAction::Change } else { SyncAction::Add };
                fixtures::entry(action, fixtures::vtodo(uid, summary))
            }
            TaskOp::Delete { uid } => fixtures::entry(SyncAction::Delete, fixtures::vtodo(uid, "")),
        }
    }
}

/// Strategy for task UIDs from a pool of `pool` values.
pub fn uid_strategy(pool: usize) -> impl Strategy<Value = String> {
    (0..pool.max(1)).prop_map(|i| format!("task-{i}"))
}

/// Strategy for version markers.
pub fn etag_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-f0-9]{8}").expect("Invalid regex")
}

/// Strategy for task summaries without leading or trailing blanks.
pub fn summary_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9]{1,12}( [A-Za-z0-9]{1,12}){0,3}").expect("Invalid regex")
}

/// Strategy for a single task change.
pub fn task_op_strategy(pool: usize) -> impl Strategy<Value = TaskOp> {
    prop_oneof![
        3 => (uid_strategy(pool), etag_strategy(), summary_strategy())
            .prop_map(|(uid, etag, summary)| TaskOp::Upsert { uid, etag, summary }),
        1 => uid_strategy(pool).prop_map(|uid| TaskOp::Delete { uid }),
    ]
}

/// Strategy for a feed of task changes.
pub fn task_ops_strategy(pool: usize, max_len: usize) -> impl Strategy<Value = Vec<TaskOp>> {
    prop::collection::vec(task_op_strategy(pool), 0..=max_len)
}
