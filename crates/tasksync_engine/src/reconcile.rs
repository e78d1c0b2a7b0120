//! Reconciliation of remote change records against the local store.

use crate::domain::SyncDomain;
use crate::error::{SyncError, SyncResult};
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use tasksync_protocol::{ProtocolMode, RemoteChangeRecord, SyncAction};
use tasksync_store::{LocalId, LocalRecord, LocalStore, NewRecord, RecordUpdate};
use tracing::{debug, info, warn};

/// Why a record left local state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NoOpReason {
    /// The payload decoded to zero records.
    EmptyPayload,
    /// The payload could not be decoded.
    Malformed(String),
    /// No local record matches, or no identity was available.
    MissingIdentity(String),
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOpReason::EmptyPayload => f.write_str("empty payload"),
            NoOpReason::Malformed(message) => write!(f, "malformed payload: {message}"),
            NoOpReason::MissingIdentity(identity) if identity.is_empty() => {
                f.write_str("missing identity")
            }
            NoOpReason::MissingIdentity(identity) => write!(f, "no local record for {identity}"),
        }
    }
}

/// Effect of one remote change record on local state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AppliedMutation {
    /// A new local record was created.
    Inserted(LocalId),
    /// An existing local record was overwritten in place.
    Updated(LocalId),
    /// A local record was deleted.
    Removed(LocalId),
    /// Nothing changed.
    NoOp(NoOpReason),
}

impl AppliedMutation {
    /// Returns the affected row, if any.
    pub fn local_id(&self) -> Option<LocalId> {
        match self {
            AppliedMutation::Inserted(id)
            | AppliedMutation::Updated(id)
            | AppliedMutation::Removed(id) => Some(*id),
            AppliedMutation::NoOp(_) => None,
        }
    }
}

/// Per-session mutation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounters {
    /// Records inserted.
    pub inserts: u64,
    /// Records updated in place.
    pub updates: u64,
    /// Records deleted.
    pub deletes: u64,
    /// Records that changed nothing.
    pub skipped: u64,
}

impl SyncCounters {
    /// Returns the number of mutations.
    pub fn mutations(&self) -> u64 {
        self.inserts + self.updates + self.deletes
    }

    /// Returns the number of records seen.
    pub fn total(&self) -> u64 {
        self.mutations() + self.skipped
    }
}

/// Applies remote change records to a local store under last-writer-wins.
///
/// The protocol mode is fixed at construction. Remote feed order is
/// authoritative: every record overwrites whatever the store holds, with no
/// field merging and no comparison of local modification times.
///
/// # Current protocol
///
/// Records are matched by external identity (falling back to the decoded
/// UID). Deletions remove the match; anything else updates it in place or
/// inserts a new record, storing the record's etag as version marker.
///
/// # Legacy protocol
///
/// Payloads are decoded first and matched by UID. `ADD` and `CHANGE` update
/// or insert; every other action deletes. The version marker of a legacy
/// record is its own UID.
pub struct Reconciler<D: SyncDomain> {
    mode: ProtocolMode,
    counters: SyncCounters,
    _domain: PhantomData<fn() -> D>,
}

impl<D: SyncDomain> Reconciler<D> {
    /// Creates a reconciler for one session.
    pub fn new(mode: ProtocolMode) -> Self {
        Self {
            mode,
            counters: SyncCounters::default(),
            _domain: PhantomData,
        }
    }

    /// Returns the protocol mode.
    pub fn mode(&self) -> ProtocolMode {
        self.mode
    }

    /// Returns the counters accumulated so far.
    pub fn counters(&self) -> &SyncCounters {
        &self.counters
    }

    /// Applies one remote change record.
    ///
    /// Empty, malformed and unmatched records are reported as
    /// [`AppliedMutation::NoOp`] and logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a mutation or the record body
    /// cannot be serialized. Such errors end the session.
    pub fn apply_change<S>(
        &mut self,
        record: &RemoteChangeRecord,
        store: &mut S,
    ) -> SyncResult<AppliedMutation>
    where
        S: LocalStore + ?Sized,
    {
        match self.mode {
            ProtocolMode::Current => self.apply_item(record, store),
            ProtocolMode::Legacy => self.apply_entry(record, store),
        }
    }

    fn apply_item<S>(
        &mut self,
        record: &RemoteChangeRecord,
        store: &mut S,
    ) -> SyncResult<AppliedMutation>
    where
        S: LocalStore + ?Sized,
    {
        if record.is_deletion {
            let Some(identity) = record.identity() else {
                return self.skip(SyncError::IdentityMissing("deleted item".into()));
            };
            return match store.find_by_file_name(identity)? {
                Some(local) => self.remove(store, &local),
                None => Ok(self.missing(identity)),
            };
        }

        let new_data = match self.decode_first(&record.payload) {
            Ok(Some(new_data)) => new_data,
            Ok(None) => return Ok(self.no_op(NoOpReason::EmptyPayload)),
            Err(err) => return self.skip(err),
        };

        let identity = match record.identity() {
            Some(identity) => identity.to_string(),
            None => match D::uid_of(&new_data) {
                Some(uid) => uid,
                None => return self.skip(SyncError::IdentityMissing("item".into())),
            },
        };

        let local = store.find_by_file_name(&identity)?;
        self.upsert(store, local, &new_data, identity, record.etag.clone())
    }

    fn apply_entry<S>(
        &mut self,
        record: &RemoteChangeRecord,
        store: &mut S,
    ) -> SyncResult<AppliedMutation>
    where
        S: LocalStore + ?Sized,
    {
        let new_data = match self.decode_first(&record.payload) {
            Ok(Some(new_data)) => new_data,
            Ok(None) => return Ok(self.no_op(NoOpReason::EmptyPayload)),
            Err(err) => return self.skip(err),
        };

        let Some(uid) = D::uid_of(&new_data) else {
            return self.skip(SyncError::IdentityMissing("journal entry".into()));
        };

        let local = store.find_by_uid(&uid)?;
        let upsert = record.action.as_ref().is_some_and(SyncAction::is_upsert);

        if upsert {
            // Legacy records carry their own UID as version marker
            let etag = Some(uid.clone());
            self.upsert(store, local, &new_data, uid, etag)
        } else {
            match local {
                Some(local) => self.remove(store, &local),
                None => Ok(self.missing(&uid)),
            }
        }
    }

    /// Decodes a payload and keeps its first record.
    fn decode_first(&self, payload: &[u8]) -> Result<Option<D::Record>, SyncError> {
        let mut records = D::decode(payload)?.into_iter();
        let first = records.next();

        if first.is_none() {
            warn!("Received {} without data, ignoring", D::PAYLOAD_NAME);
        } else if records.next().is_some() {
            warn!("Received multiple {}, using first one", D::PAYLOAD_NAME);
        }
        Ok(first)
    }

    fn upsert<S>(
        &mut self,
        store: &mut S,
        local: Option<LocalRecord>,
        new_data: &D::Record,
        file_name: String,
        etag: Option<String>,
    ) -> SyncResult<AppliedMutation>
    where
        S: LocalStore + ?Sized,
    {
        let kind = D::kind_of(new_data);
        let body = D::encode_body(new_data)?;

        if let Some(local) = local {
            if local.kind == kind {
                info!("Updating {} in local {}", file_name, D::KIND);
                store.update(local.id, RecordUpdate { etag, body })?;
                self.counters.updates += 1;
                return Ok(AppliedMutation::Updated(local.id));
            }

            info!(
                "{} changed from {} to {}, replacing local record {}",
                file_name, local.kind, kind, local.id
            );
            store.delete(local.id)?;
        }

        info!("Adding {} to local {}", file_name, D::KIND);
        let uid = D::uid_of(new_data).unwrap_or_else(|| file_name.clone());
        let id = store.insert(NewRecord {
            file_name: Some(file_name),
            uid,
            etag,
            kind: kind.to_string(),
            body,
        })?;
        self.counters.inserts += 1;
        Ok(AppliedMutation::Inserted(id))
    }

    fn remove<S>(&mut self, store: &mut S, local: &LocalRecord) -> SyncResult<AppliedMutation>
    where
        S: LocalStore + ?Sized,
    {
        info!(
            "Removing local record {} which has been deleted on the server",
            local.id
        );
        store.delete(local.id)?;
        self.counters.deletes += 1;
        Ok(AppliedMutation::Removed(local.id))
    }

    fn missing(&mut self, identity: &str) -> AppliedMutation {
        warn!(identity, "Tried deleting a non-existent record");
        self.no_op(NoOpReason::MissingIdentity(identity.to_string()))
    }

    /// Turns a recoverable error into a no-op and passes fatal ones on.
    fn skip(&mut self, err: SyncError) -> SyncResult<AppliedMutation> {
        if err.is_fatal() {
            return Err(err);
        }
        let reason = match &err {
            SyncError::IdentityMissing(_) => NoOpReason::MissingIdentity(String::new()),
            other => NoOpReason::Malformed(other.to_string()),
        };
        warn!(error = %err, "Skipping remote record");
        Ok(self.no_op(reason))
    }

    fn no_op(&mut self, reason: NoOpReason) -> AppliedMutation {
        debug!(%reason, "no local change");
        self.counters.skipped += 1;
        AppliedMutation::NoOp(reason)
    }
}
