mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{ScriptedRemote, StaticSession, sample_media, sample_response};
use fieldsync::application::ports::remote_store::RemoteStoreError;
use fieldsync::application::services::{SyncEngine, SyncQueues};
use fieldsync::domain::value_objects::RetryPolicy;
use fieldsync::infrastructure::connectivity::ConnectivitySignal;
use fieldsync::infrastructure::storage::SqliteLocalStore;
use fieldsync::shared::config::DatabaseConfig;

fn file_backed_config(dir: &tempfile::TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!(
            "sqlite:{}?mode=rwc",
            dir.path().join("fieldsync.db").display()
        ),
        max_connections: 1,
        connection_timeout: 5,
    }
}

#[tokio::test]
async fn queued_records_survive_a_restart_and_then_sync() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = file_backed_config(&dir);

    {
        let store = Arc::new(SqliteLocalStore::connect(&config).await?);
        let queues = SyncQueues::load(store.clone()).await?;
        queues
            .checklist_responses
            .save_offline(sample_response("srv_1", "q1"))
            .await?;
        queues
            .generic_media
            .save_offline(sample_media("srv_1", "deck.jpg", 2048))
            .await?;
        store.pool().close().await;
    }

    let store = Arc::new(SqliteLocalStore::connect(&config).await?);
    let queues = SyncQueues::load(store.clone()).await?;
    assert_eq!(queues.pending_counts().total(), 2);

    let remote = ScriptedRemote::always_ok();
    let engine = SyncEngine::new(
        queues,
        Arc::new(ConnectivitySignal::new(true)),
        remote.clone(),
        Arc::new(StaticSession),
        RetryPolicy::default(),
    );

    let report = engine.sync_once().await?;
    assert_eq!(report.synced_count(), 2);
    assert_eq!(engine.pending_counts().total(), 0);
    assert_eq!(remote.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn dead_letter_state_survives_a_restart() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = file_backed_config(&dir);

    {
        let store = Arc::new(SqliteLocalStore::connect(&config).await?);
        let queues = SyncQueues::load(store.clone()).await?;
        queues
            .checklist_responses
            .save_offline(sample_response("srv_1", "q1"))
            .await?;

        let remote = ScriptedRemote::new(Box::new(|_, _, _| {
            Err(RemoteStoreError::Validation("response_type unknown".into()))
        }));
        let engine = SyncEngine::new(
            queues,
            Arc::new(ConnectivitySignal::new(true)),
            remote,
            Arc::new(StaticSession),
            RetryPolicy::default(),
        );
        let report = engine.sync_once().await?;
        assert_eq!(report.dead_lettered_count, 1);
        store.pool().close().await;
    }

    let store = Arc::new(SqliteLocalStore::connect(&config).await?);
    let queues = SyncQueues::load(store).await?;
    assert_eq!(queues.pending_counts().total(), 0);
    assert_eq!(queues.checklist_responses.failed_count(), 1);

    let failed = queues.checklist_responses.list_failed().await?;
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].sync_attempts, 1);
    assert!(failed[0].needs_sync);
    Ok(())
}
