//! lifecycle.rs — explicit app-phase bus.
//!
//! The host app reports phase changes; the poller subscribes and treats a
//! transition into `Active` as a poll trigger. Subscribing returns a
//! receiver; dropping it unsubscribes. Phases are only broadcast on actual
//! change, so repeated `Active` reports don't re-trigger polls.

use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Active,
    Inactive,
    Background,
}

pub struct AppLifecycle {
    tx: broadcast::Sender<AppPhase>,
    current: Mutex<AppPhase>,
}

impl AppLifecycle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(8);
        Self {
            tx,
            current: Mutex::new(AppPhase::Active),
        }
    }

    pub fn current(&self) -> AppPhase {
        *self.current.lock().expect("lifecycle mutex poisoned")
    }

    /// Record a phase report from the host; broadcasts only transitions.
    pub fn set_phase(&self, next: AppPhase) {
        let mut current = self.current.lock().expect("lifecycle mutex poisoned");
        if *current == next {
            return;
        }
        debug!(from = ?*current, to = ?next, "app phase transition");
        *current = next;
        // No subscribers is fine; the send result only reports that.
        let _ = self.tx.send(next);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppPhase> {
        self.tx.subscribe()
    }
}

impl Default for AppLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
