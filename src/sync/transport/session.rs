//! Transport session manager: one live channel per active conversation.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::sync::core::errors::SyncResult;
use crate::sync::core::ids::ConversationId;
use crate::sync::core::model::Message;
use crate::sync::transport::{InboundEvent, Transport, TransportChannel};

/// Default upper bound on a single push send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Owns the open channels, keyed by conversation.
pub struct TransportSessionManager {
    transport: Arc<dyn Transport>,
    channels: DashMap<ConversationId, Arc<dyn TransportChannel>>,
    connecting: DashMap<ConversationId, Arc<Mutex<()>>>,
    inbound: mpsc::Sender<InboundEvent>,
    send_timeout: Duration,
}

impl TransportSessionManager {
    /// Create a manager and the receiving end of its inbound event queue.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        inbound_buffer: usize,
    ) -> (Self, mpsc::Receiver<InboundEvent>) {
        let (inbound, receiver) = mpsc::channel(inbound_buffer.max(1));
        let manager = Self {
            transport,
            channels: DashMap::new(),
            connecting: DashMap::new(),
            inbound,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        };
        (manager, receiver)
    }

    /// Set the upper bound on a single push send.
    #[must_use]
    pub const fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Open a channel for a conversation unless one is already open.
    ///
    /// Returns `true` when a new channel was opened. Concurrent calls for the
    /// same conversation open at most one channel; connects for different
    /// conversations do not wait on each other.
    ///
    /// # Errors
    /// Returns an error if the transport fails to connect.
    pub async fn connect(&self, conversation_id: ConversationId) -> SyncResult<bool> {
        if self.channels.contains_key(&conversation_id) {
            debug!(%conversation_id, "transport session already open");
            return Ok(false);
        }

        let guard = Arc::clone(self.connecting.entry(conversation_id).or_default().value());
        let _held = guard.lock().await;
        if self.channels.contains_key(&conversation_id) {
            return Ok(false);
        }

        let channel = self
            .transport
            .open(conversation_id, self.inbound.clone())
            .await?;
        self.channels.insert(conversation_id, Arc::from(channel));
        info!(%conversation_id, "transport session opened");
        Ok(true)
    }

    /// Push a message on its conversation's channel, best effort.
    ///
    /// Returns `true` if the channel accepted the frame within the send
    /// timeout. A missing channel, a send failure or a stalled send is logged
    /// and otherwise ignored.
    pub async fn send(&self, message: &Message) -> bool {
        let conversation_id = message.conversation_id;
        let channel = self
            .channels
            .get(&conversation_id)
            .map(|entry| Arc::clone(entry.value()));

        let Some(channel) = channel else {
            debug!(%conversation_id, "no open channel, push skipped");
            return false;
        };

        match tokio::time::timeout(self.send_timeout, channel.send(message)).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(%conversation_id, %err, "push send failed");
                false
            }
            Err(_) => {
                warn!(%conversation_id, timeout = ?self.send_timeout, "push send timed out");
                false
            }
        }
    }

    /// Close and forget a conversation's channel.
    pub fn disconnect(&self, conversation_id: ConversationId) -> bool {
        let Some((_, channel)) = self.channels.remove(&conversation_id) else {
            return false;
        };
        channel.close();
        info!(%conversation_id, "transport session closed");
        true
    }

    /// Whether a channel is open for the conversation.
    #[must_use]
    pub fn is_connected(&self, conversation_id: ConversationId) -> bool {
        self.channels.contains_key(&conversation_id)
    }

    /// Conversations with an open channel, sorted by id.
    #[must_use]
    pub fn active_conversations(&self) -> Vec<ConversationId> {
        let mut ids: Vec<ConversationId> = self.channels.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Close every open channel.
    pub fn close_all(&self) {
        for id in self.active_conversations() {
            self.disconnect(id);
        }
    }
}
