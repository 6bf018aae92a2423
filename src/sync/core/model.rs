//! Conversation and message records exchanged with the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sync::core::ids::{ConversationId, CorrelationId, MessageId, UserId};

/// Persistence status of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Known only from the push transport; no server identifier yet.
    Pending,
    /// Stored by the Persistence API and carrying its identifier.
    Confirmed,
}

/// A chat message as stored in a conversation sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server identifier, absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Conversation the message belongs to.
    pub conversation_id: ConversationId,
    /// Author of the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserId>,
    /// Message body.
    #[serde(default, alias = "content")]
    pub text: String,
    /// Creation time reported by the sender or the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Client correlation id, when the message originated from a draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<CorrelationId>,
    /// Server fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Persistence status derived from the presence of a server id.
    #[must_use]
    pub const fn status(&self) -> MessageStatus {
        if self.id.is_some() {
            MessageStatus::Confirmed
        } else {
            MessageStatus::Pending
        }
    }

    /// Whether both records describe the same logical message.
    ///
    /// Matches on confirmed server id first, then on client correlation id.
    #[must_use]
    pub fn same_message(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.id, other.id) {
            return a == b;
        }
        matches!((self.client_ref, other.client_ref), (Some(a), Some(b)) if a == b)
    }
}

/// Outgoing message data supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Message body.
    pub text: String,
    /// Author, when the server expects it in the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserId>,
    /// Correlation id shared by the push and the persistence call.
    pub client_ref: CorrelationId,
    /// Additional payload fields forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageDraft {
    /// Build a draft with a fresh correlation id.
    #[must_use]
    pub fn new(conversation_id: ConversationId, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            text: text.into(),
            sender: None,
            client_ref: CorrelationId::new(),
            extra: Map::new(),
        }
    }

    /// Set the sender.
    #[must_use]
    pub const fn with_sender(mut self, sender: UserId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Attach an extra payload field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Unconfirmed message pushed on the transport.
    #[must_use]
    pub fn to_pending(&self) -> Message {
        Message {
            id: None,
            conversation_id: self.conversation_id,
            sender: self.sender,
            text: self.text.clone(),
            timestamp: Some(Utc::now()),
            client_ref: Some(self.client_ref),
            extra: self.extra.clone(),
        }
    }
}

/// A conversation in the user's directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server identifier.
    pub id: ConversationId,
    /// Participants of the conversation.
    #[serde(default)]
    pub participants: Vec<UserId>,
    /// Last activity reported by the server.
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    /// Server fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Conversation {
    /// Build a conversation record with no metadata.
    #[must_use]
    pub fn new(id: ConversationId, participants: Vec<UserId>) -> Self {
        Self {
            id,
            participants,
            last_activity: None,
            extra: Map::new(),
        }
    }
}
