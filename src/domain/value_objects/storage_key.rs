use super::{EntityKind, RecordId};
use std::fmt;

/// Namespaced key under which a queued record is stored, in the form
/// `<kind prefix><record id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(kind: EntityKind, id: &RecordId) -> Self {
        Self(format!("{}{}", kind.storage_prefix(), id.as_str()))
    }

    /// Split a raw store key back into its kind and record id.
    pub fn parse(key: &str) -> Option<(EntityKind, RecordId)> {
        for kind in EntityKind::ALL {
            if let Some(rest) = key.strip_prefix(kind.storage_prefix()) {
                return RecordId::parse(rest).ok().map(|id| (kind, id));
            }
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}
