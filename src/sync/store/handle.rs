//! Shared store handle used by the orchestrator, dispatcher and inbound pump.

use tokio::sync::{RwLock, watch};
use tracing::debug;

use crate::sync::store::events::ChatEvent;
use crate::sync::store::reducer::{Applied, apply};
use crate::sync::store::state::ChatState;

/// Conversation/message store.
///
/// All mutation goes through [`ChatStore::dispatch`]; readers take snapshots
/// or borrow the state under a read guard.
pub struct ChatStore {
    state: RwLock<ChatState>,
    revision: watch::Sender<u64>,
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(ChatState::default())
    }

    /// Create a store seeded with an existing state.
    #[must_use]
    pub fn with_state(state: ChatState) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(state),
            revision,
        }
    }

    /// Apply an event and notify subscribers.
    pub async fn dispatch(&self, event: ChatEvent) -> Applied {
        let name = event.name();
        let applied = {
            let mut guard = self.state.write().await;
            apply(&mut guard, event)
        };
        self.revision.send_modify(|rev| *rev += 1);
        debug!(event = name, ?applied, "store transition");
        applied
    }

    /// Clone the current state.
    pub async fn snapshot(&self) -> ChatState {
        self.state.read().await.clone()
    }

    /// Read from the state without cloning it.
    pub async fn read<R>(&self, f: impl FnOnce(&ChatState) -> R) -> R {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Subscribe to the revision counter, bumped after every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of transitions applied so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}
