//! State held by the conversation/message store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sync::core::errors::SyncOperation;
use crate::sync::core::ids::{ConversationId, UserId};
use crate::sync::core::model::{Conversation, Message};

/// Process-wide loading/error flag kept for callers that read a single status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Whether a request is in flight.
    pub is_loading: bool,
    /// Last unhandled failure, until cleared or overwritten.
    pub error: Option<String>,
}

/// Slot identifying one operation's status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "operation", content = "target", rename_all = "snake_case")]
pub enum OperationKey {
    /// Listing the conversations of a user.
    ListConversations(UserId),
    /// Loading the history of a conversation.
    LoadHistory(ConversationId),
    /// Creating a conversation.
    CreateConversation,
    /// Persisting a message into a conversation.
    CreateMessage(ConversationId),
}

impl OperationKey {
    /// Operation kind of this slot.
    #[must_use]
    pub const fn operation(self) -> SyncOperation {
        match self {
            Self::ListConversations(_) => SyncOperation::ListConversations,
            Self::LoadHistory(_) => SyncOperation::LoadHistory,
            Self::CreateConversation => SyncOperation::CreateConversation,
            Self::CreateMessage(_) => SyncOperation::CreateMessage,
        }
    }
}

/// Status of a single operation slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum OperationStatus {
    /// Never started, or reset.
    #[default]
    Idle,
    /// Request in flight.
    Pending,
    /// Last request succeeded.
    Succeeded,
    /// Last request failed with this message.
    Failed(String),
}

impl OperationStatus {
    /// Whether the operation is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Failure message, if the last request failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Complete chat state: directory, message index and status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatState {
    /// Conversation directory in insertion order.
    pub conversations: Vec<Conversation>,
    /// Ordered message sequences keyed by conversation.
    pub messages: HashMap<ConversationId, Vec<Message>>,
    /// Global loading/error flag.
    pub sync: SyncState,
    /// Per-operation status slots.
    pub operations: HashMap<OperationKey, OperationStatus>,
}

impl ChatState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Message sequence of a conversation (empty if never loaded).
    #[must_use]
    pub fn messages_for(&self, conversation_id: ConversationId) -> &[Message] {
        self.messages
            .get(&conversation_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a conversation in the directory.
    #[must_use]
    pub fn conversation(&self, conversation_id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    /// Status of an operation slot.
    #[must_use]
    pub fn operation(&self, key: OperationKey) -> OperationStatus {
        self.operations.get(&key).cloned().unwrap_or_default()
    }

    /// Whether a request is in flight (global flag).
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.sync.is_loading
    }

    /// Global error message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.sync.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state() {
        let state = ChatState::new();
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        assert!(state.messages_for(ConversationId::new(1)).is_empty());
        assert_eq!(
            state.operation(OperationKey::CreateConversation),
            OperationStatus::Idle
        );
    }

    #[test]
    fn test_operation_key_kind() {
        assert_eq!(
            OperationKey::LoadHistory(ConversationId::new(5)).operation(),
            SyncOperation::LoadHistory
        );
        assert_eq!(
            OperationKey::CreateMessage(ConversationId::new(5)).operation(),
            SyncOperation::CreateMessage
        );
    }

    #[test]
    fn test_status_accessors() {
        assert!(OperationStatus::Pending.is_pending());
        assert_eq!(OperationStatus::Failed("boom".to_string()).error(), Some("boom"));
        assert_eq!(OperationStatus::Succeeded.error(), None);
    }
}
