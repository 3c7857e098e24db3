pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

use std::sync::Arc;

use application::ports::connectivity::ConnectivityMonitor;
use application::ports::local_store::LocalStore;
use application::ports::remote_store::RemoteStore;
use application::ports::session::SessionProvider;
use infrastructure::remote::HttpRemoteStore;
use infrastructure::storage::SqliteLocalStore;
use shared::config::AppConfig;

pub use application::ports;
pub use application::services::{
    EntityQueue, MergedEntry, SyncEngine, SyncQueues, merge_with_pending,
};
pub use domain::entities::{
    ChecklistResponse, MediaAttachment, PendingCounts, QueuedRecord, ResponseChoice,
    SurveyDetails, SyncEntity, SyncNotice, SyncReport, SyncedRecord,
};
pub use domain::value_objects::{
    Backoff, EntityKind, RecordId, RetryPolicy, StorageKey, SurveyorId, SyncStatus,
};
pub use infrastructure::connectivity::ConnectivitySignal;
pub use shared::error::{AppError, Result};

/// Wire the default infrastructure (SQLite store, HTTP remote) around the
/// host-supplied connectivity signal and session, and load the queues from
/// whatever the last run left behind. Call `start` on the result to replay
/// it and follow connectivity.
pub async fn build_engine(
    config: &AppConfig,
    connectivity: Arc<dyn ConnectivityMonitor>,
    session: Arc<dyn SessionProvider>,
) -> Result<Arc<SyncEngine>> {
    let store: Arc<dyn LocalStore> =
        Arc::new(SqliteLocalStore::connect(&config.database).await?);
    let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemoteStore::new(&config.remote)?);
    let queues = SyncQueues::load(store).await?;
    Ok(SyncEngine::new(
        queues,
        connectivity,
        remote,
        session,
        RetryPolicy::from(&config.sync),
    ))
}

pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldsync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
