//! Pure state transitions.
//!
//! Every append keeps existing order, and no transition removes a message or
//! a conversation. Only the two `*Loaded` events replace data wholesale.

use crate::sync::core::ids::ConversationId;
use crate::sync::core::model::{Conversation, Message, MessageStatus};
use crate::sync::store::events::ChatEvent;
use crate::sync::store::state::{ChatState, OperationKey, OperationStatus};

/// Effect of applying one event, reported for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// Only status fields changed.
    Status,
    /// A directory or sequence was replaced wholesale.
    Replaced,
    /// A conversation or message was appended.
    Appended,
    /// An existing entry was updated in place.
    Merged,
    /// The event matched an existing entry and was dropped.
    Duplicate,
}

/// Apply an event to a state and return the next state.
#[must_use]
pub fn reduce(mut state: ChatState, event: ChatEvent) -> ChatState {
    let _ = apply(&mut state, event);
    state
}

/// Apply an event in place.
pub fn apply(state: &mut ChatState, event: ChatEvent) -> Applied {
    match event {
        ChatEvent::RequestStarted(key) => {
            state.sync.is_loading = true;
            state.operations.insert(key, OperationStatus::Pending);
            Applied::Status
        }
        ChatEvent::ConversationsLoaded {
            user_id,
            conversations,
        } => {
            succeed(state, OperationKey::ListConversations(user_id));
            state.conversations = conversations;
            Applied::Replaced
        }
        ChatEvent::HistoryLoaded {
            conversation_id,
            messages,
        } => {
            succeed(state, OperationKey::LoadHistory(conversation_id));
            state.messages.insert(conversation_id, messages);
            Applied::Replaced
        }
        ChatEvent::ConversationCreated(conversation) => {
            succeed(state, OperationKey::CreateConversation);
            upsert_conversation(&mut state.conversations, conversation)
        }
        ChatEvent::MessageCreated { requested, message } => {
            succeed(state, OperationKey::CreateMessage(requested));
            let conversation_id = message.conversation_id;
            append_message(state, conversation_id, message)
        }
        ChatEvent::MessageReceived {
            conversation_id,
            message,
        } => append_message(state, conversation_id, message),
        ChatEvent::RequestFailed { key, error } => {
            state.sync.is_loading = false;
            state.sync.error = Some(error.clone());
            state.operations.insert(key, OperationStatus::Failed(error));
            Applied::Status
        }
        ChatEvent::ErrorCleared => {
            state.sync.error = None;
            for status in state.operations.values_mut() {
                if matches!(status, OperationStatus::Failed(_)) {
                    *status = OperationStatus::Idle;
                }
            }
            Applied::Status
        }
    }
}

fn succeed(state: &mut ChatState, key: OperationKey) {
    state.sync.is_loading = false;
    state.operations.insert(key, OperationStatus::Succeeded);
}

fn upsert_conversation(directory: &mut Vec<Conversation>, conversation: Conversation) -> Applied {
    if let Some(existing) = directory.iter_mut().find(|c| c.id == conversation.id) {
        *existing = conversation;
        return Applied::Merged;
    }
    directory.push(conversation);
    Applied::Appended
}

/// Append to a conversation's sequence, creating it if absent.
///
/// A confirmed copy of a pending entry replaces it at the same position;
/// any other match is an echo and is dropped.
fn append_message(
    state: &mut ChatState,
    conversation_id: ConversationId,
    message: Message,
) -> Applied {
    let sequence = state.messages.entry(conversation_id).or_default();

    if let Some(existing) = sequence.iter_mut().find(|m| m.same_message(&message)) {
        if existing.status() == MessageStatus::Pending
            && message.status() == MessageStatus::Confirmed
        {
            *existing = message;
            return Applied::Merged;
        }
        return Applied::Duplicate;
    }

    sequence.push(message);
    Applied::Appended
}
