use crate::application::ports::connectivity::ConnectivityMonitor;
use crate::application::ports::remote_store::RemoteStore;
use crate::application::ports::session::SessionProvider;
use crate::application::services::entity_queue::{EntityQueue, SyncQueues};
use crate::domain::entities::{PendingCounts, SyncEntity, SyncNotice, SyncReport, SyncedRecord};
use crate::domain::value_objects::{RetryPolicy, SurveyorId, SyncStatus};
use crate::shared::error::AppError;
use crate::shared::metrics::{self, PassOutcomeMetadata, PassOutcomeStatus};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

const NOTICE_CHANNEL_CAPACITY: usize = 32;

/// Replays queued offline records against the remote store.
///
/// Passes run on startup, on every offline→online transition, and on
/// explicit request. A tokio mutex serializes passes; triggers arriving
/// while one is running coalesce into a single follow-up pass. The
/// `Syncing` state is held in memory only, so a crash mid-pass leaves every
/// record `Pending`.
pub struct SyncEngine {
    queues: SyncQueues,
    connectivity: Arc<dyn ConnectivityMonitor>,
    remote: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionProvider>,
    policy: RetryPolicy,
    gate: Mutex<()>,
    trigger_pending: AtomicBool,
    notices: broadcast::Sender<SyncNotice>,
}

impl SyncEngine {
    pub fn new(
        queues: SyncQueues,
        connectivity: Arc<dyn ConnectivityMonitor>,
        remote: Arc<dyn RemoteStore>,
        session: Arc<dyn SessionProvider>,
        policy: RetryPolicy,
    ) -> Arc<Self> {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Arc::new(Self {
            queues,
            connectivity,
            remote,
            session,
            policy,
            gate: Mutex::new(()),
            trigger_pending: AtomicBool::new(false),
            notices,
        })
    }

    pub fn queues(&self) -> &SyncQueues {
        &self.queues
    }

    pub fn pending_counts(&self) -> PendingCounts {
        self.queues.pending_counts()
    }

    /// Subscribe to the pass summaries the engine broadcasts for the host's
    /// toast/banner channel.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.notices.subscribe()
    }

    /// Replay whatever survived the last shutdown, then follow the
    /// connectivity signal.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.trigger_sync();
        self.spawn_online_listener()
    }

    /// Schedule a sync pass. Returns immediately; while a pass is running,
    /// any number of triggers collapse into exactly one follow-up pass.
    pub fn trigger_sync(self: &Arc<Self>) {
        if self.trigger_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = engine.gate.lock().await;
            engine.trigger_pending.store(false, Ordering::Release);
            if let Err(err) = engine.run_pass("triggered").await {
                warn!(target: "sync::engine", error = %err, "sync pass aborted");
            }
        });
    }

    /// Run one pass to completion. Explicit-user-action entry point; also
    /// what tests drive.
    pub async fn sync_once(&self) -> Result<SyncReport, AppError> {
        let _guard = self.gate.lock().await;
        self.run_pass("manual").await
    }

    /// Watch the connectivity channel and schedule a pass on every
    /// offline→online edge. The reverse edge never cancels an in-flight
    /// record; the per-record re-check inside the pass handles it.
    pub fn spawn_online_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut rx = engine.connectivity.subscribe();
        tokio::spawn(async move {
            let mut was_online = *rx.borrow();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if online && !was_online {
                    info!(
                        target: "sync::engine",
                        "connectivity restored, scheduling sync pass"
                    );
                    engine.trigger_sync();
                }
                was_online = online;
            }
        })
    }

    async fn run_pass(&self, trigger: &str) -> Result<SyncReport, AppError> {
        let pass_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let mut report = SyncReport::new(pass_id.clone());

        if !self.connectivity.is_online() {
            debug!(
                target: "sync::engine",
                pass_id = %pass_id,
                "offline, skipping sync pass"
            );
            report.aborted_offline = true;
            report.pending_count = self.queues.pending_counts().total() as u32;
            self.record_metrics(&report, trigger, PassOutcomeStatus::Aborted);
            return Ok(report);
        }

        let Some(surveyor) = self.session.current_surveyor() else {
            warn!(
                target: "sync::engine",
                pass_id = %pass_id,
                "no active session, records stay queued"
            );
            report.pending_count = self.queues.pending_counts().total() as u32;
            self.record_metrics(&report, trigger, PassOutcomeStatus::Aborted);
            return Err(AppError::Auth(
                "no active session for sync pass".to_string(),
            ));
        };

        let mut offline = self
            .drain_queue(&self.queues.surveys, &surveyor, &mut report)
            .await?;
        if !offline {
            offline = self
                .drain_queue(&self.queues.checklist_responses, &surveyor, &mut report)
                .await?;
        }
        if !offline {
            offline = self
                .drain_queue(&self.queues.checklist_media, &surveyor, &mut report)
                .await?;
        }
        if !offline {
            self.drain_queue(&self.queues.generic_media, &surveyor, &mut report)
                .await?;
        }

        report.pending_count = self.queues.pending_counts().total() as u32;
        report.duration_ms = started.elapsed().as_millis() as u64;

        if report.synced_count() > 0 {
            let _ = self.notices.send(SyncNotice::Synced {
                count: report.synced_count(),
            });
        } else if report.failed_count > 0 {
            let _ = self.notices.send(SyncNotice::Failed {
                count: report.failed_count,
            });
        }

        let status = if report.aborted_offline {
            PassOutcomeStatus::Aborted
        } else {
            PassOutcomeStatus::Completed
        };
        self.record_metrics(&report, trigger, status);

        info!(
            target: "sync::engine",
            pass_id = %report.pass_id,
            synced = report.synced_count(),
            failed = report.failed_count,
            pending = report.pending_count,
            duration_ms = report.duration_ms,
            "sync pass finished"
        );

        Ok(report)
    }

    /// Replay one queue's due records sequentially. Returns true when
    /// connectivity flipped offline and the rest of the batch must stop.
    async fn drain_queue<E: SyncEntity>(
        &self,
        queue: &EntityQueue<E>,
        surveyor: &SurveyorId,
        report: &mut SyncReport,
    ) -> Result<bool, AppError> {
        let now = Utc::now();
        let pending = queue.list_pending().await?;

        for mut record in pending {
            if !self.connectivity.is_online() {
                warn!(
                    target: "sync::engine",
                    kind = %queue.kind(),
                    "connectivity lost mid-pass, stopping batch"
                );
                report.aborted_offline = true;
                return Ok(true);
            }

            if !self
                .policy
                .is_due(record.sync_attempts, record.updated_at, now)
            {
                continue;
            }

            // In-memory only: a crash here must leave the stored record pending.
            record.sync_status = SyncStatus::Syncing;

            let payload = serde_json::to_value(&record.payload)?;
            match self.remote.create(queue.kind(), surveyor, payload).await {
                Ok(remote_record) => {
                    queue.mark_synced(&record.id).await?;
                    debug!(
                        target: "sync::engine",
                        kind = %queue.kind(),
                        local_id = %record.id,
                        canonical_id = %remote_record.id,
                        "record synced"
                    );
                    report.synced.push(SyncedRecord {
                        kind: queue.kind(),
                        local_id: record.id,
                        canonical_id: remote_record.id,
                        data: remote_record.data,
                    });
                }
                Err(err) => {
                    let attempts_after = record.sync_attempts + 1;
                    let terminal =
                        !err.is_retryable() || self.policy.exhausts_budget(attempts_after);
                    let status = queue
                        .mark_failed(&record.id, &err.to_string(), terminal)
                        .await?;
                    report.failed_count += 1;
                    if status == SyncStatus::Failed {
                        report.dead_lettered_count += 1;
                    }
                    warn!(
                        target: "sync::engine",
                        kind = %queue.kind(),
                        local_id = %record.id,
                        attempts = attempts_after,
                        terminal,
                        error = %err,
                        "record sync failed"
                    );
                }
            }
        }

        Ok(false)
    }

    fn record_metrics(&self, report: &SyncReport, trigger: &str, status: PassOutcomeStatus) {
        metrics::record_pass(
            status,
            &PassOutcomeMetadata {
                pass_id: Some(report.pass_id.clone()),
                trigger: Some(trigger.to_string()),
                synced_count: Some(report.synced_count()),
                failed_count: Some(report.failed_count),
                pending_count: Some(report.pending_count),
                duration_ms: Some(report.duration_ms),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::local_store::LocalStore;
    use crate::application::ports::remote_store::{RemoteRecord, RemoteStoreError};
    use crate::domain::entities::{ChecklistResponse, ResponseChoice};
    use crate::domain::value_objects::{Backoff, EntityKind, RecordId};
    use crate::infrastructure::connectivity::ConnectivitySignal;
    use crate::infrastructure::storage::MemoryLocalStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::AtomicU32;
    use tokio::sync::Semaphore;

    type Script =
        Box<dyn Fn(u32, EntityKind, &Value) -> Result<RemoteRecord, RemoteStoreError> + Send + Sync>;

    struct ScriptedRemote {
        calls: AtomicU32,
        script: Script,
    }

    impl ScriptedRemote {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                script,
            })
        }

        fn always_ok() -> Arc<Self> {
            Self::new(Box::new(|call, _, _| {
                Ok(RemoteRecord {
                    id: RecordId::parse(&format!("rec_{call}")).unwrap(),
                    data: serde_json::json!({"id": format!("rec_{call}")}),
                })
            }))
        }

        fn always_err(
            build: impl Fn() -> RemoteStoreError + Send + Sync + 'static,
        ) -> Arc<Self> {
            Self::new(Box::new(move |_, _, _| Err(build())))
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl crate::application::ports::remote_store::RemoteStore for ScriptedRemote {
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

    /// Remote that parks every call on a semaphore, for overlap tests.
    struct GatedRemote {
        calls: AtomicU32,
        permits: Semaphore,
    }

    #[async_trait]
    impl crate::application::ports::remote_store::RemoteStore for GatedRemote {
        async fn create(
            &self,
            _kind: EntityKind,
            _surveyor: &SurveyorId,
            _payload: Value,
        ) -> Result<RemoteRecord, RemoteStoreError> {
            let permit = self.permits.acquire().await.expect("semaphore closed");
            permit.forget();
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RemoteStoreError::Timeout("scripted".to_string()))
        }
    }

    struct StaticSession;

    impl SessionProvider for StaticSession {
        fn current_surveyor(&self) -> Option<SurveyorId> {
            Some(SurveyorId::new("surveyor_7".to_string()).unwrap())
        }
    }

    struct NoSession;

    impl SessionProvider for NoSession {
        fn current_surveyor(&self) -> Option<SurveyorId> {
            None
        }
    }

    fn sample_response(question_id: &str) -> ChecklistResponse {
        ChecklistResponse {
            survey_id: RecordId::parse("srv_1").unwrap(),
            question_id: question_id.to_string(),
            response: ResponseChoice::Yes,
            comment: None,
        }
    }

    async fn setup_engine(
        remote: Arc<dyn RemoteStore>,
        policy: RetryPolicy,
    ) -> (Arc<SyncEngine>, Arc<MemoryLocalStore>, Arc<ConnectivitySignal>) {
        let store = Arc::new(MemoryLocalStore::new());
        let signal = Arc::new(ConnectivitySignal::new(true));
        let queues = SyncQueues::load(store.clone()).await.unwrap();
        let engine = SyncEngine::new(
            queues,
            signal.clone(),
            remote,
            Arc::new(StaticSession),
            policy,
        );
        (engine, store, signal)
    }

    #[tokio::test]
    async fn pass_drains_pending_records_and_clears_store() {
        let remote = ScriptedRemote::always_ok();
        let (engine, store, _signal) =
            setup_engine(remote.clone(), RetryPolicy::default()).await;
        let mut notices = engine.subscribe();

        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q1"))
            .await
            .unwrap();
        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q2"))
            .await
            .unwrap();

        let report = engine.sync_once().await.unwrap();
        assert_eq!(report.synced_count(), 2);
        assert_eq!(report.failed_count, 0);
        assert_eq!(report.pending_count, 0);
        assert!(!report.aborted_offline);
        assert!(report.synced.iter().all(|r| r.local_id.is_temporary()));
        assert!(report.synced.iter().all(|r| !r.canonical_id.is_temporary()));

        let keys = store.list_keys("offline_checklist_response_").await.unwrap();
        assert!(keys.is_empty());

        assert_eq!(notices.recv().await.unwrap(), SyncNotice::Synced { count: 2 });
    }

    #[tokio::test]
    async fn offline_pass_aborts_without_network_calls() {
        let remote = ScriptedRemote::always_ok();
        let (engine, _store, signal) =
            setup_engine(remote.clone(), RetryPolicy::default()).await;
        signal.set_online(false);

        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q1"))
            .await
            .unwrap();

        let report = engine.sync_once().await.unwrap();
        assert!(report.aborted_offline);
        assert_eq!(report.synced_count(), 0);
        assert_eq!(report.pending_count, 1);
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn one_failing_record_does_not_block_the_rest() {
        let remote = ScriptedRemote::new(Box::new(|call, _, payload| {
            if payload["question_id"] == "q3" {
                Err(RemoteStoreError::Timeout("deadline exceeded".to_string()))
            } else {
                Ok(RemoteRecord {
                    id: RecordId::parse(&format!("rec_{call}")).unwrap(),
                    data: serde_json::json!({}),
                })
            }
        }));
        let (engine, _store, _signal) =
            setup_engine(remote.clone(), RetryPolicy::default()).await;

        for question in ["q1", "q2", "q3", "q4", "q5"] {
            engine
                .queues()
                .checklist_responses
                .save_offline(sample_response(question))
                .await
                .unwrap();
        }

        let report = engine.sync_once().await.unwrap();
        assert_eq!(report.synced_count(), 4);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.pending_count, 1);

        let pending = engine
            .queues()
            .checklist_responses
            .list_pending()
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload.question_id, "q3");
        assert_eq!(pending[0].sync_attempts, 1);
        assert_eq!(
            pending[0].last_sync_error.as_deref(),
            Some("Request timed out: deadline exceeded")
        );
    }

    #[tokio::test]
    async fn connectivity_flip_mid_pass_stops_the_batch_promptly() {
        let store = Arc::new(MemoryLocalStore::new());
        let signal = Arc::new(ConnectivitySignal::new(true));
        let flip = signal.clone();
        let remote = ScriptedRemote::new(Box::new(move |call, _, _| {
            // First create succeeds but takes the network down with it.
            flip.set_online(false);
            Ok(RemoteRecord {
                id: RecordId::parse(&format!("rec_{call}")).unwrap(),
                data: serde_json::json!({}),
            })
        }));
        let queues = SyncQueues::load(store.clone()).await.unwrap();
        let engine = SyncEngine::new(
            queues,
            signal.clone(),
            remote.clone(),
            Arc::new(StaticSession),
            RetryPolicy::default(),
        );

        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q1"))
            .await
            .unwrap();
        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q2"))
            .await
            .unwrap();

        let report = engine.sync_once().await.unwrap();
        assert!(report.aborted_offline);
        assert_eq!(report.synced_count(), 1);
        assert_eq!(remote.call_count(), 1);

        // Nothing disappeared: the untouched record is still queued.
        let pending = engine
            .queues()
            .checklist_responses
            .list_pending()
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload.question_id, "q2");
        assert_eq!(pending[0].sync_attempts, 0);
    }

    #[tokio::test]
    async fn missing_session_aborts_the_pass_and_keeps_records() {
        let remote = ScriptedRemote::always_ok();
        let store = Arc::new(MemoryLocalStore::new());
        let signal = Arc::new(ConnectivitySignal::new(true));
        let queues = SyncQueues::load(store.clone()).await.unwrap();
        let engine = SyncEngine::new(
            queues,
            signal,
            remote.clone(),
            Arc::new(NoSession),
            RetryPolicy::default(),
        );

        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q1"))
            .await
            .unwrap();

        let err = engine.sync_once().await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert_eq!(remote.call_count(), 0);
        assert_eq!(engine.pending_counts().total(), 1);
    }

    #[tokio::test]
    async fn validation_failure_dead_letters_immediately() {
        let remote =
            ScriptedRemote::always_err(|| RemoteStoreError::Validation("missing field".into()));
        let (engine, _store, _signal) =
            setup_engine(remote.clone(), RetryPolicy::default()).await;
        let mut notices = engine.subscribe();

        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q1"))
            .await
            .unwrap();

        let report = engine.sync_once().await.unwrap();
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.dead_lettered_count, 1);
        assert_eq!(notices.recv().await.unwrap(), SyncNotice::Failed { count: 1 });

        // Dead-lettered records are off the replay path until requeued.
        let second = engine.sync_once().await.unwrap();
        assert_eq!(second.failed_count, 0);
        assert_eq!(remote.call_count(), 1);

        let failed = engine
            .queues()
            .checklist_responses
            .list_failed()
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].needs_sync);
    }

    #[tokio::test]
    async fn transient_failures_dead_letter_at_the_attempt_ceiling() {
        let remote =
            ScriptedRemote::always_err(|| RemoteStoreError::Timeout("deadline".into()));
        let (engine, _store, _signal) =
            setup_engine(remote.clone(), RetryPolicy::new(3, None)).await;

        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q1"))
            .await
            .unwrap();

        engine.sync_once().await.unwrap();
        engine.sync_once().await.unwrap();
        let third = engine.sync_once().await.unwrap();
        assert_eq!(third.dead_lettered_count, 1);
        assert_eq!(remote.call_count(), 3);

        let failed = engine
            .queues()
            .checklist_responses
            .list_failed()
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].sync_attempts, 3);
    }

    #[tokio::test]
    async fn backoff_skips_freshly_failed_records() {
        let remote =
            ScriptedRemote::always_err(|| RemoteStoreError::Timeout("deadline".into()));
        let policy = RetryPolicy::new(
            5,
            Some(Backoff {
                base_secs: 3_600,
                cap_secs: 7_200,
            }),
        );
        let (engine, _store, _signal) = setup_engine(remote.clone(), policy).await;

        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q1"))
            .await
            .unwrap();

        engine.sync_once().await.unwrap();
        let second = engine.sync_once().await.unwrap();
        assert_eq!(second.failed_count, 0);
        assert_eq!(remote.call_count(), 1);
        assert_eq!(engine.pending_counts().total(), 1);
    }

    #[tokio::test]
    async fn rapid_triggers_coalesce_into_one_follow_up_pass() {
        let remote = Arc::new(GatedRemote {
            calls: AtomicU32::new(0),
            permits: Semaphore::new(0),
        });
        let store = Arc::new(MemoryLocalStore::new());
        let signal = Arc::new(ConnectivitySignal::new(true));
        let queues = SyncQueues::load(store.clone()).await.unwrap();
        let engine = SyncEngine::new(
            queues,
            signal,
            remote.clone(),
            Arc::new(StaticSession),
            RetryPolicy::default(),
        );

        engine
            .queues()
            .checklist_responses
            .save_offline(sample_response("q1"))
            .await
            .unwrap();

        engine.trigger_sync();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        // Pass one is parked inside the remote call; these must coalesce
        // into exactly one more pass.
        engine.trigger_sync();
        engine.trigger_sync();
        engine.trigger_sync();

        remote.permits.add_permits(8);
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
    }
}
