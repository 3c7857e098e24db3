use crate::domain::entities::{QueuedRecord, SyncEntity};
use crate::domain::value_objects::RecordId;

/// One row of the list a host renders: either a canonical remote record or a
/// local copy still waiting to sync.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntry<E> {
    pub id: RecordId,
    pub entity: E,
    pub pending: bool,
}

/// Merge remote-fetched records with the local pending copies, deduplicated
/// by the entity's natural key. The first record seen for a key wins unless
/// a later one is more complete.
pub fn merge_with_pending<E: SyncEntity>(
    remote: Vec<(RecordId, E)>,
    pending: &[QueuedRecord<E>],
) -> Vec<MergedEntry<E>> {
    let mut merged: Vec<MergedEntry<E>> = Vec::with_capacity(remote.len() + pending.len());
    let mut by_key: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    let remote_entries = remote
        .into_iter()
        .map(|(id, entity)| MergedEntry {
            id,
            entity,
            pending: false,
        });
    let pending_entries = pending.iter().map(|record| MergedEntry {
        id: record.id.clone(),
        entity: record.payload.clone(),
        pending: true,
    });

    for entry in remote_entries.chain(pending_entries) {
        let key = entry.entity.natural_key();
        match by_key.get(&key) {
            None => {
                by_key.insert(key, merged.len());
                merged.push(entry);
            }
            Some(&slot) => {
                if entry.entity.completeness() > merged[slot].entity.completeness() {
                    merged[slot] = entry;
                }
            }
        }
    }

    merged
}
