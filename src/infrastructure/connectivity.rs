use crate::application::ports::connectivity::ConnectivityMonitor;
use tokio::sync::watch;
use tracing::info;

/// Bridge between the host platform's native connectivity signal and the
/// engine. The platform glue calls `set_online` on each transition; the
/// watch channel fans the state out to the engine's listener without
/// polling.
pub struct ConnectivitySignal {
    state: watch::Sender<bool>,
}

impl ConnectivitySignal {
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        Self { state }
    }

    /// Feed a platform transition in. Repeated reports of the same state do
    /// not wake subscribers.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|state| {
            if *state != online {
                *state = online;
                true
            } else {
                false
            }
        });
        if changed {
            info!(
                target: "sync::connectivity",
                online,
                "connectivity changed"
            );
        }
    }
}

impl ConnectivityMonitor for ConnectivitySignal {
    fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
