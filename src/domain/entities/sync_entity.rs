use crate::domain::value_objects::RecordId;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Behavior every queueable entity payload must expose to the queue and
/// merge layers.
pub trait SyncEntity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Entity-specific dedup key (e.g. `question_id` for checklist
    /// responses) used to merge a local pending copy with its remote
    /// counterpart and to upsert repeated offline saves of the same logical
    /// entity.
    fn natural_key(&self) -> String;

    /// Logical parent record, when the entity belongs to one (responses and
    /// media belong to a survey).
    fn parent_id(&self) -> Option<&RecordId>;

    /// Count of populated fields. When two records share a natural key the
    /// more complete one wins.
    fn completeness(&self) -> usize;
}
