#![allow(unused_imports)]

pub mod entities;
pub mod value_objects;

pub use entities::{
    ChecklistResponse, MediaAttachment, PendingCounts, QueuedRecord, ResponseChoice,
    SurveyDetails, SyncEntity, SyncNotice, SyncReport, SyncedRecord,
};
pub use value_objects::{
    Backoff, EntityKind, RecordId, RetryPolicy, StorageKey, SurveyorId, SyncStatus,
};
