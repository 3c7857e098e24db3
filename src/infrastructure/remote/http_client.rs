use crate::application::ports::remote_store::{RemoteRecord, RemoteStore, RemoteStoreError};
use crate::domain::value_objects::{EntityKind, RecordId, SurveyorId};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP adapter for the backend's entity creation API. One POST per create,
/// bounded by the configured request deadline; no local-store access.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, kind: EntityKind) -> String {
        format!("{}/api/{}", self.base_url, kind.endpoint_path())
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn create(
        &self,
        kind: EntityKind,
        surveyor: &SurveyorId,
        payload: Value,
    ) -> Result<RemoteRecord, RemoteStoreError> {
        let body = enrich_payload(payload, surveyor)?;
        let url = self.endpoint(kind);
        debug!(target: "sync::remote", kind = %kind, url = %url, "posting record");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            let body: Value = response
                .json()
                .await
                .map_err(|err| RemoteStoreError::InvalidResponse(err.to_string()))?;
            parse_record(body)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(map_status(status, message))
        }
    }
}

/// Queued records carry no owner; the surveyor resolved at sync time is
/// stamped into the creation payload here.
fn enrich_payload(payload: Value, surveyor: &SurveyorId) -> Result<Value, RemoteStoreError> {
    let mut map = match payload {
        Value::Object(map) => map,
        _ => {
            return Err(RemoteStoreError::Validation(
                "creation payload must be a JSON object".to_string(),
            ));
        }
    };
    map.insert(
        "surveyor_id".to_string(),
        Value::String(surveyor.to_string()),
    );
    Ok(Value::Object(map))
}

fn classify_transport(err: reqwest::Error) -> RemoteStoreError {
    if err.is_timeout() {
        RemoteStoreError::Timeout(err.to_string())
    } else {
        RemoteStoreError::Connection(err.to_string())
    }
}

fn map_status(status: u16, message: String) -> RemoteStoreError {
    match status {
        401 | 403 => RemoteStoreError::Auth(message),
        400 | 409 | 422 => RemoteStoreError::Validation(message),
        _ => RemoteStoreError::Server { status, message },
    }
}

fn parse_record(body: Value) -> Result<RemoteRecord, RemoteStoreError> {
    let id = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            RemoteStoreError::InvalidResponse("create response carries no id".to_string())
        })?;
    let id = RecordId::parse(id).map_err(RemoteStoreError::InvalidResponse)?;
    Ok(RemoteRecord { id, data: body })
}
