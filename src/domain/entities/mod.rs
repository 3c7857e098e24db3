pub mod checklist;
pub mod media;
pub mod queued_record;
pub mod survey;
pub mod sync_entity;
pub mod sync_report;

pub use checklist::{ChecklistResponse, ResponseChoice};
pub use media::MediaAttachment;
pub use queued_record::QueuedRecord;
pub use survey::SurveyDetails;
pub use sync_entity::SyncEntity;
pub use sync_report::{PendingCounts, SyncNotice, SyncReport, SyncedRecord};
