use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the authenticated surveyor, resolved at sync time. Records
/// captured offline do not carry one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyorId(String);

impl SurveyorId {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Surveyor id cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for SurveyorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SurveyorId> for String {
    fn from(id: SurveyorId) -> Self {
        id.0
    }
}
