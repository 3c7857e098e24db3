use tokio::sync::watch;

/// Current online/offline state plus transition events, sourced from the
/// host platform's native connectivity signal (no polling).
///
/// The offline→online transition is the sole automatic trigger for a sync
/// pass; the engine also re-reads `is_online` before each record so a
/// half-finished batch stops promptly when the state flips.
pub trait ConnectivityMonitor: Send + Sync {
    fn is_online(&self) -> bool;
    fn subscribe(&self) -> watch::Receiver<bool>;
}
