//! `ChatSync`: wires store, persistence, transport and the inbound pump.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::sync::api::{HttpPersistenceApi, PersistenceApi};
use crate::sync::core::config::SyncConfig;
use crate::sync::core::errors::SyncResult;
use crate::sync::core::model::{Message, MessageDraft};
use crate::sync::dispatch::MessageDispatcher;
use crate::sync::orchestrator::SyncOrchestrator;
use crate::sync::store::ChatStore;
use crate::sync::transport::{InboundPump, Transport, TransportSessionManager, WebSocketTransport};

/// External collaborators used by [`ChatSync`].
#[derive(Clone)]
pub struct ChatBackends {
    /// Authoritative request/response service.
    pub api: Arc<dyn PersistenceApi>,
    /// Push transport factory.
    pub transport: Arc<dyn Transport>,
}

impl ChatBackends {
    /// HTTP persistence and WebSocket transport from configuration.
    ///
    /// # Errors
    /// Returns an error if either base URL is invalid or the HTTP client fails to build.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Ok(Self {
            api: Arc::new(HttpPersistenceApi::new(config)?),
            transport: Arc::new(WebSocketTransport::new(config)?),
        })
    }
}

/// Synchronization core handle.
///
/// Must be created inside a tokio runtime: construction spawns the task that
/// applies push deliveries to the store.
pub struct ChatSync {
    orchestrator: SyncOrchestrator,
    dispatcher: MessageDispatcher,
    pump: JoinHandle<()>,
    pump_shutdown: Arc<Notify>,
}

impl ChatSync {
    /// Build the core over the given backends.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &SyncConfig, backends: ChatBackends) -> SyncResult<Self> {
        config.validate()?;

        let store = Arc::new(ChatStore::new());
        let (sessions, inbound) =
            TransportSessionManager::new(backends.transport, config.inbound_buffer);
        let sessions = sessions.with_send_timeout(config.push_timeout);
        let pump = InboundPump::new(Arc::clone(&store), inbound);
        let pump_shutdown = pump.shutdown_notifier();

        let orchestrator = SyncOrchestrator::new(store, backends.api, Arc::new(sessions));
        let dispatcher = MessageDispatcher::new(orchestrator.clone());

        info!(api = %config.api_base_url, ws = %config.ws_base_url, "chat sync ready");
        Ok(Self {
            orchestrator,
            dispatcher,
            pump: pump.spawn(),
            pump_shutdown,
        })
    }

    /// Build the core with HTTP and WebSocket backends.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Self::new(config, ChatBackends::from_config(config)?)
    }

    /// Shared store.
    #[must_use]
    pub const fn store(&self) -> &Arc<ChatStore> {
        self.orchestrator.store()
    }

    /// Request/response flows.
    #[must_use]
    pub const fn orchestrator(&self) -> &SyncOrchestrator {
        &self.orchestrator
    }

    /// Outgoing message flow.
    #[must_use]
    pub const fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    /// Push then persist a message.
    ///
    /// # Errors
    /// Returns the Persistence API error.
    pub async fn send_message(&self, draft: &MessageDraft) -> SyncResult<Message> {
        self.dispatcher.send_message(draft).await
    }

    /// Close every channel and stop the inbound pump.
    pub async fn shutdown(self) {
        self.orchestrator.sessions().close_all();
        self.pump_shutdown.notify_one();
        if let Err(err) = self.pump.await {
            debug!(%err, "inbound pump ended abnormally");
        }
        info!("chat sync stopped");
    }
}
