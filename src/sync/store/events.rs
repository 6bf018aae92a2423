//! Events accepted by the store.

use crate::sync::core::ids::{ConversationId, UserId};
use crate::sync::core::model::{Conversation, Message};
use crate::sync::store::state::OperationKey;

/// A state transition request.
///
/// Request outcomes carry enough context to update both the global flag and
/// the per-operation slot they belong to.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    /// A request entered the pending state.
    RequestStarted(OperationKey),
    /// The user's conversation list arrived; replaces the directory.
    ConversationsLoaded {
        /// User whose conversations were listed.
        user_id: UserId,
        /// Full directory returned by the server.
        conversations: Vec<Conversation>,
    },
    /// A conversation's history arrived; replaces its sequence.
    HistoryLoaded {
        /// Conversation whose history was fetched.
        conversation_id: ConversationId,
        /// Full sequence returned by the server.
        messages: Vec<Message>,
    },
    /// A conversation was created on the server.
    ConversationCreated(Conversation),
    /// A message was persisted on the server.
    MessageCreated {
        /// Conversation the draft was sent to; names the operation slot.
        requested: ConversationId,
        /// Persisted record, appended under its own `conversation_id`.
        message: Message,
    },
    /// A message arrived on the push transport.
    MessageReceived {
        /// Conversation the channel is scoped to.
        conversation_id: ConversationId,
        /// Delivered message.
        message: Message,
    },
    /// A request failed.
    RequestFailed {
        /// Operation slot that failed.
        key: OperationKey,
        /// Message surfaced to the caller.
        error: String,
    },
    /// The caller acknowledged the current error.
    ErrorCleared,
}

impl ChatEvent {
    /// Persisted message stored where it was requested.
    #[must_use]
    pub const fn message_created(message: Message) -> Self {
        Self::MessageCreated {
            requested: message.conversation_id,
            message,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RequestStarted(_) => "request_started",
            Self::ConversationsLoaded { .. } => "conversations_loaded",
            Self::HistoryLoaded { .. } => "history_loaded",
            Self::ConversationCreated(_) => "conversation_created",
            Self::MessageCreated { .. } => "message_created",
            Self::MessageReceived { .. } => "message_received",
            Self::RequestFailed { .. } => "request_failed",
            Self::ErrorCleared => "error_cleared",
        }
    }
}
