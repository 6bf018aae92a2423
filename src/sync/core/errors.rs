//! Error types for the synchronization core.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Synchronization error type.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The Persistence API answered with a non-success status.
    #[error("persistence API rejected request with status {status}: {}", message.as_deref().unwrap_or("no error message"))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// `error` field of the response body, when the server sent one.
        message: Option<String>,
    },
    /// HTTP transport failure talking to the Persistence API.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Push transport failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// WebSocket protocol error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    /// Operation did not complete within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Server-provided error message, if the failure carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Message to surface in sync state for a failed operation.
    ///
    /// Falls back to the operation's default text when the server gave none.
    #[must_use]
    pub fn user_message(&self, operation: SyncOperation) -> String {
        self.server_message()
            .unwrap_or_else(|| operation.default_error())
            .to_string()
    }

    /// Whether the error came from the push transport rather than persistence.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::WebSocket(_))
    }
}

/// Convenience result alias for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// The four request/response flows of the Sync Orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    /// List a user's conversations.
    ListConversations,
    /// Load one conversation's history.
    LoadHistory,
    /// Create a conversation.
    CreateConversation,
    /// Persist a message.
    CreateMessage,
}

impl SyncOperation {
    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListConversations => "list_conversations",
            Self::LoadHistory => "load_history",
            Self::CreateConversation => "create_conversation",
            Self::CreateMessage => "create_message",
        }
    }

    /// Human-readable error used when the server provides no message.
    #[must_use]
    pub const fn default_error(self) -> &'static str {
        match self {
            Self::ListConversations => "Failed to load conversations.",
            Self::LoadHistory => "Failed to load messages.",
            Self::CreateConversation => "Failed to create conversation.",
            Self::CreateMessage => "Failed to send message.",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
