use super::sync_entity::SyncEntity;
use crate::domain::value_objects::RecordId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A ship survey inspection captured in the field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyDetails {
    pub client_name: String,
    pub vessel_name: String,
    pub imo_number: Option<String>,
    pub survey_type: Option<String>,
    pub survey_date: NaiveDate,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl SyncEntity for SurveyDetails {
    fn natural_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.client_name, self.vessel_name, self.survey_date
        )
    }

    fn parent_id(&self) -> Option<&RecordId> {
        None
    }

    fn completeness(&self) -> usize {
        3 + usize::from(self.imo_number.is_some())
            + usize::from(self.survey_type.is_some())
            + usize::from(self.location.is_some())
            + usize::from(self.notes.is_some())
    }
}
