pub mod connectivity;
pub mod remote;
pub mod storage;

pub use connectivity::ConnectivitySignal;
pub use remote::HttpRemoteStore;
pub use storage::{MemoryLocalStore, SqliteLocalStore};
