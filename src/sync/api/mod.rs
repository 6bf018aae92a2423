//! Persistence API: the authoritative request/response collaborator.

pub mod http;

pub use http::HttpPersistenceApi;

use std::future::Future;
use std::pin::Pin;

use crate::sync::core::errors::SyncResult;
use crate::sync::core::ids::{ConversationId, UserId};
use crate::sync::core::model::{Conversation, Message, MessageDraft};

/// Boxed future type for Persistence API operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstraction over the Persistence API.
pub trait PersistenceApi: Send + Sync {
    /// Persist a message and return the stored record.
    ///
    /// # Errors
    /// Returns an error if the request fails or is rejected.
    fn create_message<'a>(&'a self, draft: &'a MessageDraft) -> ApiFuture<'a, SyncResult<Message>>;

    /// List the conversations a user participates in.
    ///
    /// # Errors
    /// Returns an error if the request fails or is rejected.
    fn fetch_conversations(&self, user_id: UserId) -> ApiFuture<'_, SyncResult<Vec<Conversation>>>;

    /// Fetch the full message history of a conversation.
    ///
    /// # Errors
    /// Returns an error if the request fails or is rejected.
    fn fetch_conversation_history(
        &self,
        conversation_id: ConversationId,
    ) -> ApiFuture<'_, SyncResult<Vec<Message>>>;

    /// Create a conversation between the given participants.
    ///
    /// # Errors
    /// Returns an error if the request fails or is rejected.
    fn create_conversation<'a>(
        &'a self,
        participants: &'a [UserId],
    ) -> ApiFuture<'a, SyncResult<Conversation>>;
}
