//! Push transport: per-conversation live channels and inbound delivery.
//!
//! The transport is a latency optimization. Nothing here is allowed to block
//! or fail the persistence path.

pub mod inbound;
pub mod session;
pub mod websocket;

pub use inbound::InboundPump;
pub use session::TransportSessionManager;
pub use websocket::WebSocketTransport;

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::sync::core::errors::SyncResult;
use crate::sync::core::ids::ConversationId;
use crate::sync::core::model::Message;

/// Boxed future type for transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A message delivered by the push transport.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundEvent {
    /// Conversation the delivery belongs to.
    pub conversation_id: ConversationId,
    /// Delivered message.
    pub message: Message,
}

/// One live channel scoped to a conversation.
pub trait TransportChannel: Send + Sync {
    /// Push a message on this channel.
    ///
    /// # Errors
    /// Returns an error if the channel is closed or the frame cannot be encoded.
    fn send<'a>(&'a self, message: &'a Message) -> TransportFuture<'a, SyncResult<()>>;

    /// Close the channel. Idempotent.
    fn close(&self);
}

/// Factory for conversation channels.
pub trait Transport: Send + Sync {
    /// Open a channel for a conversation; deliveries go to `inbound`.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    fn open(
        &self,
        conversation_id: ConversationId,
        inbound: mpsc::Sender<InboundEvent>,
    ) -> TransportFuture<'_, SyncResult<Box<dyn TransportChannel>>>;
}
