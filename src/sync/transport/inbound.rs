//! Background task feeding push deliveries into the store.

use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::sync::store::{Applied, ChatEvent, ChatStore};
use crate::sync::transport::InboundEvent;

/// Drains the inbound event queue and applies `MessageReceived` transitions.
pub struct InboundPump {
    store: Arc<ChatStore>,
    inbound: mpsc::Receiver<InboundEvent>,
    shutdown: Arc<Notify>,
}

impl InboundPump {
    /// Create a pump over the receiving end of a session manager's queue.
    #[must_use]
    pub fn new(store: Arc<ChatStore>, inbound: mpsc::Receiver<InboundEvent>) -> Self {
        Self {
            store,
            inbound,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a shutdown notifier to stop the pump.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the pump as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Apply deliveries until shutdown is signaled or every sender is gone.
    async fn run(mut self) {
        debug!("inbound pump started");
        loop {
            tokio::select! {
                event = self.inbound.recv() => {
                    let Some(InboundEvent { conversation_id, message }) = event else {
                        debug!("inbound queue closed");
                        break;
                    };
                    let applied = self
                        .store
                        .dispatch(ChatEvent::MessageReceived { conversation_id, message })
                        .await;
                    if applied == Applied::Duplicate {
                        debug!(%conversation_id, "echo dropped");
                    }
                }
                () = self.shutdown.notified() => {
                    info!("inbound pump shutting down");
                    break;
                }
            }
        }
    }
}
