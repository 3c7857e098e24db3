use super::sync_entity::SyncEntity;
use crate::domain::value_objects::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseChoice {
    Yes,
    No,
    NotApplicable,
}

impl ResponseChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseChoice::Yes => "yes",
            ResponseChoice::No => "no",
            ResponseChoice::NotApplicable => "not_applicable",
        }
    }
}

impl fmt::Display for ResponseChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Answer to one checklist question of a survey. Deduplicated against the
/// remote copy by `question_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistResponse {
    pub survey_id: RecordId,
    pub question_id: String,
    pub response: ResponseChoice,
    pub comment: Option<String>,
}

impl SyncEntity for ChecklistResponse {
    fn natural_key(&self) -> String {
        self.question_id.clone()
    }

    fn parent_id(&self) -> Option<&RecordId> {
        Some(&self.survey_id)
    }

    fn completeness(&self) -> usize {
        2 + usize::from(self.comment.is_some())
    }
}
