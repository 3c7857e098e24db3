use crate::application::ports::local_store::LocalStore;
use crate::domain::entities::{
    ChecklistResponse, MediaAttachment, PendingCounts, QueuedRecord, SurveyDetails, SyncEntity,
};
use crate::domain::value_objects::{EntityKind, RecordId, StorageKey, SyncStatus};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct IndexEntry {
    natural_key: String,
    parent: Option<String>,
    created_at: DateTime<Utc>,
}

/// In-memory index over the durable store, seeded by one prefix scan at
/// load time and maintained incrementally, so a sync pass never re-enumerates
/// the full store.
#[derive(Debug, Default)]
struct QueueIndex {
    pending: HashMap<String, IndexEntry>,
    failed: HashMap<String, IndexEntry>,
}

/// Typed queue over the local store for one entity kind: persists records
/// needing sync under the kind's key namespace and tracks their replay
/// bookkeeping. A single queue instance is the only writer of its namespace.
pub struct EntityQueue<E: SyncEntity> {
    kind: EntityKind,
    store: Arc<dyn LocalStore>,
    index: RwLock<QueueIndex>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: SyncEntity> EntityQueue<E> {
    /// Build the queue and seed its index from the store.
    pub async fn load(kind: EntityKind, store: Arc<dyn LocalStore>) -> Result<Self, AppError> {
        let queue = Self {
            kind,
            store,
            index: RwLock::new(QueueIndex::default()),
            _entity: PhantomData,
        };

        let keys = queue.store.list_keys(kind.storage_prefix()).await?;
        let mut index = QueueIndex::default();
        for key in keys {
            let Some(value) = queue.store.get(&key).await? else {
                continue;
            };
            let record: QueuedRecord<E> = Self::decode(&value)?;
            let entry = Self::index_entry(&record);
            if record.is_dead_lettered() {
                index.failed.insert(record.id.to_string(), entry);
            } else {
                index.pending.insert(record.id.to_string(), entry);
            }
        }

        debug!(
            target: "sync::queue",
            kind = %kind,
            pending = index.pending.len(),
            failed = index.failed.len(),
            "entity queue loaded"
        );

        *queue.index.write().expect("queue index poisoned") = index;
        Ok(queue)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Persist a record captured offline. Saving the same logical entity
    /// again (same parent and natural key) rewrites the existing pending
    /// record in place instead of queuing a duplicate.
    ///
    /// A store write failure propagates to the caller; the record is never
    /// partially written.
    pub async fn save_offline(&self, payload: E) -> Result<QueuedRecord<E>, AppError> {
        let natural_key = payload.natural_key();
        let parent = payload.parent_id().map(ToString::to_string);
        let existing_id = {
            let index = self.index.read().expect("queue index poisoned");
            index
                .pending
                .iter()
                .find(|(_, entry)| entry.natural_key == natural_key && entry.parent == parent)
                .map(|(id, _)| id.clone())
        };

        let record = match existing_id {
            Some(id) => {
                let id = RecordId::parse(&id).map_err(AppError::Internal)?;
                let mut record = self
                    .fetch(&id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("queued {} {}", self.kind, id)))?;
                record.replace_payload(payload);
                self.persist(&record).await?;
                debug!(
                    target: "sync::queue",
                    kind = %self.kind,
                    id = %record.id,
                    "rewrote queued record for repeated save"
                );
                record
            }
            None => {
                let record = QueuedRecord::new_offline(payload);
                self.persist(&record).await?;
                let mut index = self.index.write().expect("queue index poisoned");
                index
                    .pending
                    .insert(record.id.to_string(), Self::index_entry(&record));
                debug!(
                    target: "sync::queue",
                    kind = %self.kind,
                    id = %record.id,
                    "queued offline record"
                );
                record
            }
        };

        Ok(record)
    }

    /// Every record awaiting replay, in creation-time order (deterministic
    /// per pass). Dead-lettered records are excluded.
    pub async fn list_pending(&self) -> Result<Vec<QueuedRecord<E>>, AppError> {
        self.list_indexed(false).await
    }

    /// Dead-lettered records awaiting manual intervention.
    pub async fn list_failed(&self) -> Result<Vec<QueuedRecord<E>>, AppError> {
        self.list_indexed(true).await
    }

    /// Pending records whose logical parent is the given record (e.g. the
    /// media still queued for one survey).
    pub async fn pending_for_parent(
        &self,
        parent: &RecordId,
    ) -> Result<Vec<QueuedRecord<E>>, AppError> {
        let parent_key = parent.to_string();
        let pending = self.list_pending().await?;
        Ok(pending
            .into_iter()
            .filter(|record| {
                record
                    .payload
                    .parent_id()
                    .map(|id| id.as_str() == parent_key)
                    .unwrap_or(false)
            })
            .collect())
    }

    /// Drop the queue entry after the remote store confirmed persistence.
    /// Idempotent: a second call for the same id is a no-op.
    pub async fn mark_synced(&self, id: &RecordId) -> Result<(), AppError> {
        let key = StorageKey::new(self.kind, id);
        self.store.delete(key.as_str()).await?;
        let mut index = self.index.write().expect("queue index poisoned");
        index.pending.remove(id.as_str());
        index.failed.remove(id.as_str());
        Ok(())
    }

    /// Rewrite a record after a failed replay: attempt count up, last error
    /// recorded, `needs_sync` still true. `terminal` dead-letters the record.
    pub async fn mark_failed(
        &self,
        id: &RecordId,
        error: &str,
        terminal: bool,
    ) -> Result<SyncStatus, AppError> {
        let mut record = self
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("queued {} {}", self.kind, id)))?;
        record.note_failure(error.to_string(), terminal);
        self.persist(&record).await?;

        let mut index = self.index.write().expect("queue index poisoned");
        let entry = Self::index_entry(&record);
        if terminal {
            index.pending.remove(id.as_str());
            index.failed.insert(id.to_string(), entry);
        } else {
            index.failed.remove(id.as_str());
            index.pending.insert(id.to_string(), entry);
        }
        Ok(record.sync_status)
    }

    /// Move a dead-lettered record back to pending with a fresh retry
    /// budget.
    pub async fn requeue(&self, id: &RecordId) -> Result<(), AppError> {
        let mut record = self
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("queued {} {}", self.kind, id)))?;
        record.requeue();
        self.persist(&record).await?;

        let mut index = self.index.write().expect("queue index poisoned");
        let entry = Self::index_entry(&record);
        index.failed.remove(id.as_str());
        index.pending.insert(id.to_string(), entry);
        Ok(())
    }

    /// Remove a record without syncing it (operator gave up on it).
    pub async fn discard(&self, id: &RecordId) -> Result<(), AppError> {
        self.mark_synced(id).await
    }

    pub fn pending_count(&self) -> usize {
        self.index
            .read()
            .expect("queue index poisoned")
            .pending
            .len()
    }

    pub fn failed_count(&self) -> usize {
        self.index
            .read()
            .expect("queue index poisoned")
            .failed
            .len()
    }

    async fn list_indexed(&self, failed: bool) -> Result<Vec<QueuedRecord<E>>, AppError> {
        let mut ids: Vec<(String, DateTime<Utc>)> = {
            let index = self.index.read().expect("queue index poisoned");
            let map = if failed { &index.failed } else { &index.pending };
            map.iter()
                .map(|(id, entry)| (id.clone(), entry.created_at))
                .collect()
        };
        ids.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut records = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for (id, _) in ids {
            let record_id = RecordId::parse(&id).map_err(AppError::Internal)?;
            match self.fetch(&record_id).await? {
                Some(record) => records.push(record),
                None => missing.push(id),
            }
        }

        if !missing.is_empty() {
            warn!(
                target: "sync::queue",
                kind = %self.kind,
                count = missing.len(),
                "dropping index entries with no store value"
            );
            let mut index = self.index.write().expect("queue index poisoned");
            for id in missing {
                index.pending.remove(&id);
                index.failed.remove(&id);
            }
        }

        Ok(records)
    }

    async fn fetch(&self, id: &RecordId) -> Result<Option<QueuedRecord<E>>, AppError> {
        let key = StorageKey::new(self.kind, id);
        match self.store.get(key.as_str()).await? {
            Some(value) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    async fn persist(&self, record: &QueuedRecord<E>) -> Result<(), AppError> {
        let key = StorageKey::new(self.kind, &record.id);
        let value = serde_json::to_string(record)?;
        self.store.set(key.as_str(), &value).await
    }

    fn decode(value: &str) -> Result<QueuedRecord<E>, AppError> {
        serde_json::from_str(value).map_err(|err| AppError::DeserializationError(err.to_string()))
    }

    fn index_entry(record: &QueuedRecord<E>) -> IndexEntry {
        IndexEntry {
            natural_key: record.payload.natural_key(),
            parent: record.payload.parent_id().map(ToString::to_string),
            created_at: record.created_at,
        }
    }
}

/// One queue per entity kind, sharing the store.
pub struct SyncQueues {
    pub surveys: EntityQueue<SurveyDetails>,
    pub checklist_responses: EntityQueue<ChecklistResponse>,
    pub checklist_media: EntityQueue<MediaAttachment>,
    pub generic_media: EntityQueue<MediaAttachment>,
}

impl SyncQueues {
    pub async fn load(store: Arc<dyn LocalStore>) -> Result<Self, AppError> {
        Ok(Self {
            surveys: EntityQueue::load(EntityKind::Survey, store.clone()).await?,
            checklist_responses: EntityQueue::load(EntityKind::ChecklistResponse, store.clone())
                .await?,
            checklist_media: EntityQueue::load(EntityKind::ChecklistMedia, store.clone()).await?,
            generic_media: EntityQueue::load(EntityKind::GenericMedia, store).await?,
        })
    }

    pub fn pending_counts(&self) -> PendingCounts {
        PendingCounts {
            surveys: self.surveys.pending_count(),
            checklist_responses: self.checklist_responses.pending_count(),
            checklist_media: self.checklist_media.pending_count(),
            generic_media: self.generic_media.pending_count(),
        }
    }
}
