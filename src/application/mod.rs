pub mod ports;
pub mod services;

pub use services::{EntityQueue, SyncEngine, SyncQueues};
