//! Chat state synchronization over a push transport and a Persistence API.
//!
//! Outgoing messages are pushed on a per-conversation channel for latency and
//! persisted through the API for durability. Both outcomes, plus push
//! deliveries from peers, are reconciled in a single [`store::ChatStore`].

pub mod api;
pub mod client;
pub mod core;
pub mod dispatch;
pub mod orchestrator;
pub mod store;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{ChatBackends, ChatSync};
pub use self::core::{
    Conversation, ConversationId, CorrelationId, Message, MessageDraft, MessageId, MessageStatus,
    SyncConfig, SyncError, SyncOperation, SyncResult, UserId,
};
pub use dispatch::MessageDispatcher;
pub use orchestrator::SyncOrchestrator;
pub use store::{ChatEvent, ChatState, ChatStore, OperationKey, OperationStatus, SyncState};
