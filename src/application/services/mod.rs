pub mod entity_queue;
pub mod merge;
pub mod sync_engine;

pub use entity_queue::{EntityQueue, SyncQueues};
pub use merge::{MergedEntry, merge_with_pending};
pub use sync_engine::SyncEngine;
