use crate::domain::value_objects::{RecordId, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope persisted in the local store for every record awaiting sync.
///
/// `needs_sync` stays true until the remote store confirms persistence, at
/// which point the envelope is deleted outright; the canonical copy then
/// lives only in the merged in-memory list. The id never changes once
/// assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedRecord<P> {
    pub id: RecordId,
    pub payload: P,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub needs_sync: bool,
    pub sync_status: SyncStatus,
    pub sync_attempts: u32,
    pub last_sync_error: Option<String>,
}

impl<P> QueuedRecord<P> {
    /// Wrap a payload captured while offline (or after a failed online
    /// write) under a fresh temporary id.
    pub fn new_offline(payload: P) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::generate_temp(),
            payload,
            created_at: now,
            updated_at: now,
            needs_sync: true,
            sync_status: SyncStatus::Pending,
            sync_attempts: 0,
            last_sync_error: None,
        }
    }

    /// Replace the payload of an already-queued record (same logical entity
    /// saved again before it synced). Keeps the id, resets the failure
    /// history so the new content gets a full retry budget.
    pub fn replace_payload(&mut self, payload: P) {
        self.payload = payload;
        self.updated_at = Utc::now();
        self.sync_status = SyncStatus::Pending;
        self.sync_attempts = 0;
        self.last_sync_error = None;
    }

    /// Record a failed replay. `terminal` moves the record into the
    /// dead-letter state instead of back to pending.
    pub fn note_failure(&mut self, error: String, terminal: bool) {
        self.sync_attempts += 1;
        self.last_sync_error = Some(error);
        self.updated_at = Utc::now();
        self.sync_status = if terminal {
            SyncStatus::Failed
        } else {
            SyncStatus::Pending
        };
    }

    /// Manual intervention on a dead-lettered record: back to pending with a
    /// zeroed attempt count.
    pub fn requeue(&mut self) {
        self.sync_attempts = 0;
        self.last_sync_error = None;
        self.sync_status = SyncStatus::Pending;
        self.updated_at = Utc::now();
    }

    pub fn is_dead_lettered(&self) -> bool {
        self.sync_status == SyncStatus::Failed
    }
}
