use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable key-value persistence surviving process restarts. Values are the
/// JSON envelopes of queued records; keys are namespaced per entity kind so
/// a pending scan is a prefix scan.
///
/// All operations are idempotent and safe to retry. A failing `set` (storage
/// full, backend unavailable) must surface an error instead of dropping the
/// write, so callers can tell the user data entry did not stick.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AppError>;
}
