// Shared across the integration test binaries; not every binary uses every
// helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use fieldsync::application::ports::remote_store::{RemoteRecord, RemoteStore, RemoteStoreError};
use fieldsync::application::ports::session::SessionProvider;
use fieldsync::application::services::{SyncEngine, SyncQueues};
use fieldsync::domain::value_objects::RetryPolicy;
use fieldsync::infrastructure::connectivity::ConnectivitySignal;
use fieldsync::infrastructure::storage::MemoryLocalStore;
use fieldsync::{ChecklistResponse, EntityKind, MediaAttachment, RecordId, ResponseChoice,
    SurveyDetails, SurveyorId};
use serde_json::Value;

pub const TEST_SURVEYOR: &str = "surveyor_7";

pub struct StaticSession;

impl SessionProvider for StaticSession {
    fn current_surveyor(&self) -> Option<SurveyorId> {
        Some(SurveyorId::new(TEST_SURVEYOR.to_string()).expect("surveyor id"))
    }
}

pub type Script =
    Box<dyn Fn(u32, EntityKind, &Value) -> Result<RemoteRecord, RemoteStoreError> + Send + Sync>;

/// Remote store double driven by a per-call script.
pub struct ScriptedRemote {
    calls: AtomicU32,
    script: Script,
}

impl ScriptedRemote {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            script,
        })
    }

    pub fn always_ok() -> Arc<Self> {
        Self::new(Box::new(|call, _, _| {
            Ok(RemoteRecord {
                id: RecordId::parse(&format!("rec_{call}")).expect("canonical id"),
                data: serde_json::json!({ "id": format!("rec_{call}") }),
            })
        }))
    }

    pub fn always_timeout() -> Arc<Self> {
        Self::new(Box::new(|_, _, _| {
            Err(RemoteStoreError::Timeout("deadline exceeded".to_string()))
        }))
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for ScriptedRemote {
    async fn create(
        &self,
        kind: EntityKind,
        _surveyor: &SurveyorId,
        payload: Value,
    ) -> Result<RemoteRecord, RemoteStoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)(call, kind, &payload)
    }
}

pub fn sample_survey() -> SurveyDetails {
    SurveyDetails {
        client_name: "Harborline Shipping".to_string(),
        vessel_name: "MV Aurora".to_string(),
        imo_number: Some("9321483".to_string()),
        survey_type: Some("annual".to_string()),
        survey_date: NaiveDate::from_ymd_opt(2025, 6, 14).expect("date"),
        location: Some("Rotterdam".to_string()),
        notes: None,
    }
}

pub fn sample_response(survey_id: &str, question_id: &str) -> ChecklistResponse {
    ChecklistResponse {
        survey_id: RecordId::parse(survey_id).expect("survey id"),
        question_id: question_id.to_string(),
        response: ResponseChoice::Yes,
        comment: None,
    }
}

pub fn sample_media(survey_id: &str, file_name: &str, size: usize) -> MediaAttachment {
    MediaAttachment::new(
        RecordId::parse(survey_id).expect("survey id"),
        Some("q3".to_string()),
        file_name.to_string(),
        "image/jpeg".to_string(),
        Bytes::from(vec![0xa5u8; size]),
    )
}

pub struct EngineContext {
    pub engine: Arc<SyncEngine>,
    pub store: Arc<MemoryLocalStore>,
    pub signal: Arc<ConnectivitySignal>,
}

pub async fn engine_with_memory_store(
    remote: Arc<dyn RemoteStore>,
    initially_online: bool,
) -> EngineContext {
    engine_with_policy(remote, initially_online, RetryPolicy::default()).await
}

pub async fn engine_with_policy(
    remote: Arc<dyn RemoteStore>,
    initially_online: bool,
    policy: RetryPolicy,
) -> EngineContext {
    let store = Arc::new(MemoryLocalStore::new());
    let signal = Arc::new(ConnectivitySignal::new(initially_online));
    let queues = SyncQueues::load(store.clone()).await.expect("queues load");
    let engine = SyncEngine::new(
        queues,
        signal.clone(),
        remote,
        Arc::new(StaticSession),
        policy,
    );
    EngineContext {
        engine,
        store,
        signal,
    }
}
