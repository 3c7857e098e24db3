use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of syncable record. Each kind owns a key namespace in the local
/// store and a creation endpoint on the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Survey,
    ChecklistResponse,
    ChecklistMedia,
    GenericMedia,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Survey,
        EntityKind::ChecklistResponse,
        EntityKind::ChecklistMedia,
        EntityKind::GenericMedia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Survey => "survey",
            EntityKind::ChecklistResponse => "checklist_response",
            EntityKind::ChecklistMedia => "checklist_media",
            EntityKind::GenericMedia => "media",
        }
    }

    /// Key namespace in the local store. A prefix scan over one of these
    /// finds every queued record of the kind.
    pub fn storage_prefix(&self) -> &'static str {
        match self {
            EntityKind::Survey => "offline_survey_",
            EntityKind::ChecklistResponse => "offline_checklist_response_",
            EntityKind::ChecklistMedia => "offline_checklist_media_",
            EntityKind::GenericMedia => "offline_media_",
        }
    }

    /// Path segment of the remote creation endpoint.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            EntityKind::Survey => "surveys",
            EntityKind::ChecklistResponse => "checklist-responses",
            EntityKind::ChecklistMedia => "checklist-media",
            EntityKind::GenericMedia => "media",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
