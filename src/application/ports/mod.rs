pub mod connectivity;
pub mod local_store;
pub mod remote_store;
pub mod session;

pub use connectivity::ConnectivityMonitor;
pub use local_store::LocalStore;
pub use remote_store::{RemoteRecord, RemoteStore, RemoteStoreError};
pub use session::SessionProvider;
