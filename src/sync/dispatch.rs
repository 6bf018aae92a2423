//! Outgoing message flow: optimistic push, then authoritative persistence.

use tracing::debug;

use crate::sync::core::errors::SyncResult;
use crate::sync::core::model::{Message, MessageDraft};
use crate::sync::orchestrator::SyncOrchestrator;

/// Sends messages on both channels and reconciles the outcome.
#[derive(Clone)]
pub struct MessageDispatcher {
    orchestrator: SyncOrchestrator,
}

impl MessageDispatcher {
    /// Create a dispatcher sharing the orchestrator's store and sessions.
    #[must_use]
    pub const fn new(orchestrator: SyncOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Push a draft on its conversation's channel, then persist it.
    ///
    /// The push is best effort and bounded by the session send timeout, so a
    /// stalled channel never holds up persistence. Only the persisted record is added to the
    /// store; a push that reaches peers while persistence fails leaves the
    /// local sequence unchanged.
    ///
    /// # Errors
    /// Returns the Persistence API error.
    pub async fn send_message(&self, draft: &MessageDraft) -> SyncResult<Message> {
        let pushed = self
            .orchestrator
            .sessions()
            .send(&draft.to_pending())
            .await;
        debug!(
            conversation_id = %draft.conversation_id,
            client_ref = %draft.client_ref,
            pushed,
            "push attempted"
        );
        self.orchestrator.create_message(draft).await
    }
}
