//! Core synchronization types and identifiers.

pub mod config;
pub mod errors;
pub mod ids;
pub mod model;

pub use config::SyncConfig;
pub use errors::{SyncError, SyncOperation, SyncResult};
pub use ids::{ConversationId, CorrelationId, MessageId, UserId};
pub use model::{Conversation, Message, MessageDraft, MessageStatus};
