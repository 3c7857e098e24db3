use super::sync_entity::SyncEntity;
use crate::domain::value_objects::RecordId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A photo or document captured against a survey, optionally pinned to a
/// checklist question. The raw bytes are opaque to the engine and travel
/// base64-encoded inside the stored JSON envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaAttachment {
    pub survey_id: RecordId,
    pub question_id: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(with = "base64_data")]
    pub data: Bytes,
}

impl MediaAttachment {
    pub fn new(
        survey_id: RecordId,
        question_id: Option<String>,
        file_name: String,
        content_type: String,
        data: Bytes,
    ) -> Self {
        let size_bytes = data.len() as u64;
        Self {
            survey_id,
            question_id,
            file_name,
            content_type,
            size_bytes,
            data,
        }
    }
}

impl SyncEntity for MediaAttachment {
    fn natural_key(&self) -> String {
        match &self.question_id {
            Some(question_id) => format!("{}/{}", question_id, self.file_name),
            None => self.file_name.clone(),
        }
    }

    fn parent_id(&self) -> Option<&RecordId> {
        Some(&self.survey_id)
    }

    fn completeness(&self) -> usize {
        3 + usize::from(self.question_id.is_some()) + usize::from(!self.data.is_empty())
    }
}

mod base64_data {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
