use crate::domain::value_objects::{EntityKind, RecordId, SurveyorId};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Payload rejected: {0}")]
    Validation(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl RemoteStoreError {
    /// Timeouts, connection drops, expired sessions and 5xx responses will
    /// plausibly succeed on a later pass. A rejected payload fails
    /// identically every time, and an unparseable create response may mean
    /// the record already exists remotely, so retrying risks a duplicate.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteStoreError::Timeout(_)
            | RemoteStoreError::Connection(_)
            | RemoteStoreError::Auth(_)
            | RemoteStoreError::Server { .. } => true,
            RemoteStoreError::Validation(_) | RemoteStoreError::InvalidResponse(_) => false,
        }
    }
}

/// Canonical record returned by the backend after a successful create.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub id: RecordId,
    pub data: Value,
}

/// Thin adapter around the backend's entity creation API. Performs exactly
/// one network call per invocation and never touches the local store; all
/// local bookkeeping belongs to the orchestrator.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn create(
        &self,
        kind: EntityKind,
        surveyor: &SurveyorId,
        payload: Value,
    ) -> Result<RemoteRecord, RemoteStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_follows_the_taxonomy() {
        assert!(RemoteStoreError::Timeout("deadline".into()).is_retryable());
        assert!(RemoteStoreError::Auth("expired".into()).is_retryable());
        assert!(
            RemoteStoreError::Server {
                status: 503,
                message: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(!RemoteStoreError::Validation("missing field".into()).is_retryable());
        assert!(!RemoteStoreError::InvalidResponse("no id".into()).is_retryable());
    }
}
