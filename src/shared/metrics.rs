use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcomeStatus {
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_passes: u64,
    pub total_synced: u64,
    pub total_failed: u64,
    pub consecutive_failed_passes: u64,
    pub last_pass_ms: Option<u64>,
    pub last_outcome: Option<PassOutcomeStatus>,
    pub last_pass_id: Option<String>,
    pub last_trigger: Option<String>,
    pub last_synced_count: Option<u32>,
    pub last_failed_count: Option<u32>,
    pub last_pending_count: Option<u32>,
    pub last_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct PassOutcomeMetadata {
    pub pass_id: Option<String>,
    pub trigger: Option<String>,
    pub synced_count: Option<u32>,
    pub failed_count: Option<u32>,
    pub pending_count: Option<u32>,
    pub duration_ms: Option<u64>,
}

#[derive(Default, Clone)]
struct LastPassMetadata {
    last_outcome: Option<PassOutcomeStatus>,
    pass_id: Option<String>,
    trigger: Option<String>,
    synced_count: Option<u32>,
    failed_count: Option<u32>,
    pending_count: Option<u32>,
    duration_ms: Option<u64>,
}

struct SyncMetrics {
    passes: AtomicU64,
    synced: AtomicU64,
    failed: AtomicU64,
    consecutive_failed_passes: AtomicU64,
    last_pass_ms: AtomicU64,
    metadata: Mutex<LastPassMetadata>,
}

impl SyncMetrics {
    fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            consecutive_failed_passes: AtomicU64::new(0),
            last_pass_ms: AtomicU64::new(0),
            metadata: Mutex::new(LastPassMetadata::default()),
        }
    }

    fn record(&self, status: PassOutcomeStatus, meta: &PassOutcomeMetadata) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.synced
            .fetch_add(u64::from(meta.synced_count.unwrap_or(0)), Ordering::Relaxed);
        self.failed
            .fetch_add(u64::from(meta.failed_count.unwrap_or(0)), Ordering::Relaxed);
        self.last_pass_ms.store(current_unix_ms(), Ordering::Relaxed);

        let pass_failed =
            status == PassOutcomeStatus::Aborted || meta.failed_count.unwrap_or(0) > 0;
        if pass_failed {
            self.consecutive_failed_passes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.consecutive_failed_passes.store(0, Ordering::Relaxed);
        }

        if let Ok(mut guard) = self.metadata.lock() {
            guard.last_outcome = Some(status);
            guard.pass_id = meta.pass_id.clone();
            guard.trigger = meta.trigger.clone();
            guard.synced_count = meta.synced_count;
            guard.failed_count = meta.failed_count;
            guard.pending_count = meta.pending_count;
            guard.duration_ms = meta.duration_ms;
        }
    }

    fn snapshot(&self) -> SyncMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| LastPassMetadata::default());

        SyncMetricsSnapshot {
            total_passes: self.passes.load(Ordering::Relaxed),
            total_synced: self.synced.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            consecutive_failed_passes: self.consecutive_failed_passes.load(Ordering::Relaxed),
            last_pass_ms: to_option(self.last_pass_ms.load(Ordering::Relaxed)),
            last_outcome: metadata.last_outcome,
            last_pass_id: metadata.pass_id,
            last_trigger: metadata.trigger,
            last_synced_count: metadata.synced_count,
            last_failed_count: metadata.failed_count,
            last_pending_count: metadata.pending_count,
            last_duration_ms: metadata.duration_ms,
        }
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 { None } else { Some(value) }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

static SYNC_METRICS: LazyLock<SyncMetrics> = LazyLock::new(SyncMetrics::new);

pub fn record_pass(status: PassOutcomeStatus, metadata: &PassOutcomeMetadata) -> SyncMetricsSnapshot {
    SYNC_METRICS.record(status, metadata);
    SYNC_METRICS.snapshot()
}

pub fn snapshot() -> SyncMetricsSnapshot {
    SYNC_METRICS.snapshot()
}
