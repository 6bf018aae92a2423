//! Sync orchestrator: the request/response flows and their store transitions.
//!
//! Each operation records `RequestStarted` under its own [`OperationKey`],
//! awaits the Persistence API, then records the success event or
//! `RequestFailed`. The outcome is also returned to the caller, so nobody has
//! to read the shared loading flag to learn how their own request ended.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::sync::api::PersistenceApi;
use crate::sync::core::errors::SyncResult;
use crate::sync::core::ids::{ConversationId, UserId};
use crate::sync::core::model::{Conversation, Message, MessageDraft};
use crate::sync::store::{ChatEvent, ChatStore, OperationKey};
use crate::sync::transport::TransportSessionManager;

/// Issues the four persistence flows and activates transport sessions.
#[derive(Clone)]
pub struct SyncOrchestrator {
    store: Arc<ChatStore>,
    api: Arc<dyn PersistenceApi>,
    sessions: Arc<TransportSessionManager>,
}

impl SyncOrchestrator {
    /// Create an orchestrator over shared collaborators.
    #[must_use]
    pub fn new(
        store: Arc<ChatStore>,
        api: Arc<dyn PersistenceApi>,
        sessions: Arc<TransportSessionManager>,
    ) -> Self {
        Self {
            store,
            api,
            sessions,
        }
    }

    /// Store the orchestrator writes to.
    #[must_use]
    pub const fn store(&self) -> &Arc<ChatStore> {
        &self.store
    }

    /// Transport session manager used for activation.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<TransportSessionManager> {
        &self.sessions
    }

    /// Open the push channel for a conversation.
    ///
    /// Returns `true` if a new channel was opened. Connection failures are
    /// logged and never reach the caller.
    pub async fn activate_conversation(&self, conversation_id: ConversationId) -> bool {
        match self.sessions.connect(conversation_id).await {
            Ok(opened) => opened,
            Err(err) => {
                warn!(%conversation_id, %err, "transport connect failed");
                false
            }
        }
    }

    /// Open the push channel for a conversation without waiting for it.
    ///
    /// The connect runs on its own task; its outcome is only logged.
    pub fn activate_in_background(&self, conversation_id: ConversationId) {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.activate_conversation(conversation_id).await;
        });
    }

    /// Run a request under `key`, recording the failure in the store.
    async fn track<T>(
        &self,
        key: OperationKey,
        request: impl Future<Output = SyncResult<T>>,
    ) -> SyncResult<T> {
        self.store.dispatch(ChatEvent::RequestStarted(key)).await;
        match request.await {
            Ok(value) => Ok(value),
            Err(err) => {
                let error = err.user_message(key.operation());
                warn!(operation = %key.operation(), %err, "request failed");
                self.store
                    .dispatch(ChatEvent::RequestFailed { key, error })
                    .await;
                Err(err)
            }
        }
    }

    /// Load the user's conversation directory, replacing the current one.
    ///
    /// # Errors
    /// Returns the API error; the directory is left untouched.
    pub async fn fetch_user_conversations(&self, user_id: UserId) -> SyncResult<Vec<Conversation>> {
        let conversations = self
            .track(
                OperationKey::ListConversations(user_id),
                self.api.fetch_conversations(user_id),
            )
            .await?;
        debug!(%user_id, count = conversations.len(), "conversations loaded");
        self.store
            .dispatch(ChatEvent::ConversationsLoaded {
                user_id,
                conversations: conversations.clone(),
            })
            .await;
        Ok(conversations)
    }

    /// Load a conversation's history, replacing its message sequence.
    ///
    /// Does not touch the transport; see [`Self::open_conversation`].
    ///
    /// # Errors
    /// Returns the API error; the sequence is left untouched.
    pub async fn fetch_conversation_history(
        &self,
        conversation_id: ConversationId,
    ) -> SyncResult<Vec<Message>> {
        let messages = self
            .track(
                OperationKey::LoadHistory(conversation_id),
                self.api.fetch_conversation_history(conversation_id),
            )
            .await?;
        debug!(%conversation_id, count = messages.len(), "history loaded");
        self.store
            .dispatch(ChatEvent::HistoryLoaded {
                conversation_id,
                messages: messages.clone(),
            })
            .await;
        Ok(messages)
    }

    /// Activate a conversation's channel in the background and load its history.
    ///
    /// # Errors
    /// Returns the history request's error. Activation failures are not errors.
    pub async fn open_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> SyncResult<Vec<Message>> {
        self.activate_in_background(conversation_id);
        self.fetch_conversation_history(conversation_id).await
    }

    /// Create a conversation, add it to the directory and activate its channel
    /// in the background.
    ///
    /// # Errors
    /// Returns the API error; nothing is activated or appended.
    pub async fn create_conversation(&self, participants: &[UserId]) -> SyncResult<Conversation> {
        let conversation = self
            .track(
                OperationKey::CreateConversation,
                self.api.create_conversation(participants),
            )
            .await?;
        info!(conversation_id = %conversation.id, "conversation created");
        self.activate_in_background(conversation.id);
        self.store
            .dispatch(ChatEvent::ConversationCreated(conversation.clone()))
            .await;
        Ok(conversation)
    }

    /// Persist a message and append the confirmed record.
    ///
    /// This is the persistence half of a send on its own, for callers retrying
    /// after a transport-only push.
    ///
    /// # Errors
    /// Returns the API error; the sequence is left untouched.
    pub async fn create_message(&self, draft: &MessageDraft) -> SyncResult<Message> {
        let mut message = self
            .track(
                OperationKey::CreateMessage(draft.conversation_id),
                self.api.create_message(draft),
            )
            .await?;

        if message.client_ref.is_none() {
            message.client_ref = Some(draft.client_ref);
        }
        if message.conversation_id != draft.conversation_id {
            warn!(
                requested = %draft.conversation_id,
                returned = %message.conversation_id,
                "server stored message under another conversation"
            );
        }

        self.store
            .dispatch(ChatEvent::MessageCreated {
                requested: draft.conversation_id,
                message: message.clone(),
            })
            .await;
        Ok(message)
    }

    /// Clear the surfaced error and reset failed operation slots.
    pub async fn clear_error(&self) {
        self.store.dispatch(ChatEvent::ErrorCleared).await;
    }
}
