use crate::domain::value_objects::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A record the remote store confirmed during a pass, carrying the
/// server-assigned canonical id and body for the caller's merged list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncedRecord {
    pub kind: EntityKind,
    pub local_id: RecordId,
    pub canonical_id: RecordId,
    pub data: Value,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncReport {
    pub pass_id: String,
    pub synced: Vec<SyncedRecord>,
    pub failed_count: u32,
    pub dead_lettered_count: u32,
    pub pending_count: u32,
    pub aborted_offline: bool,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn new(pass_id: String) -> Self {
        Self {
            pass_id,
            synced: Vec::new(),
            failed_count: 0,
            dead_lettered_count: 0,
            pending_count: 0,
            aborted_offline: false,
            duration_ms: 0,
        }
    }

    pub fn synced_count(&self) -> u32 {
        self.synced.len() as u32
    }
}

/// Pending-record counts per entity kind, for the host's badge/banner state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingCounts {
    pub surveys: usize,
    pub checklist_responses: usize,
    pub checklist_media: usize,
    pub generic_media: usize,
}

impl PendingCounts {
    pub fn total(&self) -> usize {
        self.surveys + self.checklist_responses + self.checklist_media + self.generic_media
    }
}

/// Human-facing summary broadcast after a pass. Emitted when at least one
/// record synced, or when nothing synced and at least one record failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncNotice {
    Synced { count: u32 },
    Failed { count: u32 },
}

impl fmt::Display for SyncNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncNotice::Synced { count } if *count == 1 => write!(f, "1 record synced"),
            SyncNotice::Synced { count } => write!(f, "{} records synced", count),
            SyncNotice::Failed { count } if *count == 1 => write!(f, "sync failed for 1 record"),
            SyncNotice::Failed { count } => write!(f, "sync failed for {} records", count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_render_summaries() {
        assert_eq!(
            SyncNotice::Synced { count: 3 }.to_string(),
            "3 records synced"
        );
        assert_eq!(
            SyncNotice::Failed { count: 1 }.to_string(),
            "sync failed for 1 record"
        );
    }
}
