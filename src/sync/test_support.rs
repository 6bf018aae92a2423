//! In-memory fakes for the Persistence API and the push transport.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::sync::api::{ApiFuture, PersistenceApi};
use crate::sync::core::errors::{SyncError, SyncOperation, SyncResult};
use crate::sync::core::ids::{ConversationId, MessageId, UserId};
use crate::sync::core::model::{Conversation, Message, MessageDraft};
use crate::sync::transport::{InboundEvent, Transport, TransportChannel, TransportFuture};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Persistence API answering from memory.
///
/// Created messages come back confirmed, numbered from `next_message_id`,
/// without a `client_ref` (like a server that ignores unknown fields).
pub struct FakeApi {
    next_message_id: AtomicU64,
    next_conversation_id: AtomicU64,
    conversations: Vec<Conversation>,
    history: HashMap<ConversationId, Vec<Message>>,
    failures: HashMap<SyncOperation, (u16, Option<String>)>,
    stored_under: Option<ConversationId>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            next_message_id: AtomicU64::new(99),
            next_conversation_id: AtomicU64::new(12),
            conversations: Vec::new(),
            history: HashMap::new(),
            failures: HashMap::new(),
            stored_under: None,
        }
    }
}

impl FakeApi {
    pub fn with_conversations(mut self, conversations: Vec<Conversation>) -> Self {
        self.conversations = conversations;
        self
    }

    pub fn with_history(mut self, conversation_id: ConversationId, messages: Vec<Message>) -> Self {
        self.history.insert(conversation_id, messages);
        self
    }

    /// Store every created message under `conversation_id`, whatever the draft asked for.
    pub const fn storing_messages_under(mut self, conversation_id: ConversationId) -> Self {
        self.stored_under = Some(conversation_id);
        self
    }

    /// Reject `operation` with `status` and an optional `{error}` body.
    pub fn failing(mut self, operation: SyncOperation, status: u16, message: Option<&str>) -> Self {
        self.failures
            .insert(operation, (status, message.map(str::to_string)));
        self
    }

    fn check(&self, operation: SyncOperation) -> SyncResult<()> {
        self.failures
            .get(&operation)
            .map_or(Ok(()), |(status, message)| {
                Err(SyncError::Rejected {
                    status: *status,
                    message: message.clone(),
                })
            })
    }
}

/// Confirmed message as a server would return it.
pub fn confirmed(id: u64, conversation_id: ConversationId, text: &str) -> Message {
    let mut message = MessageDraft::new(conversation_id, text).to_pending();
    message.id = Some(MessageId::new(id));
    message.client_ref = None;
    message
}

impl PersistenceApi for FakeApi {
    fn create_message<'a>(&'a self, draft: &'a MessageDraft) -> ApiFuture<'a, SyncResult<Message>> {
        Box::pin(async move {
            self.check(SyncOperation::CreateMessage)?;
            let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
            let conversation_id = self.stored_under.unwrap_or(draft.conversation_id);
            let mut message = confirmed(id, conversation_id, &draft.text);
            message.sender = draft.sender;
            Ok(message)
        })
    }

    fn fetch_conversations(&self, _user_id: UserId) -> ApiFuture<'_, SyncResult<Vec<Conversation>>> {
        Box::pin(async move {
            self.check(SyncOperation::ListConversations)?;
            Ok(self.conversations.clone())
        })
    }

    fn fetch_conversation_history(
        &self,
        conversation_id: ConversationId,
    ) -> ApiFuture<'_, SyncResult<Vec<Message>>> {
        Box::pin(async move {
            self.check(SyncOperation::LoadHistory)?;
            Ok(self.history.get(&conversation_id).cloned().unwrap_or_default())
        })
    }

    fn create_conversation<'a>(
        &'a self,
        participants: &'a [UserId],
    ) -> ApiFuture<'a, SyncResult<Conversation>> {
        Box::pin(async move {
            self.check(SyncOperation::CreateConversation)?;
            let id = self.next_conversation_id.fetch_add(1, Ordering::SeqCst);
            Ok(Conversation::new(ConversationId::new(id), participants.to_vec()))
        })
    }
}

#[derive(Default)]
struct Recorded {
    opened: Vec<ConversationId>,
    sent: Vec<Message>,
    closed: usize,
    inbound: Option<mpsc::Sender<InboundEvent>>,
}

/// Transport that records opens and sends instead of touching the network.
#[derive(Default)]
pub struct RecordingTransport {
    recorded: Arc<Mutex<Recorded>>,
    fail_opens: bool,
    fail_sends: bool,
    stall_sends: bool,
    open_delays: HashMap<ConversationId, Duration>,
}

impl RecordingTransport {
    pub const fn with_failing_opens(mut self) -> Self {
        self.fail_opens = true;
        self
    }

    pub const fn with_failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Sends never complete, like a socket whose writer is wedged.
    pub const fn with_stalled_sends(mut self) -> Self {
        self.stall_sends = true;
        self
    }

    /// Opening `conversation_id` takes `delay` before it succeeds.
    pub fn with_open_delay(mut self, conversation_id: ConversationId, delay: Duration) -> Self {
        self.open_delays.insert(conversation_id, delay);
        self
    }

    pub fn opened(&self) -> Vec<ConversationId> {
        lock(&self.recorded).opened.clone()
    }

    pub fn sent(&self) -> Vec<Message> {
        lock(&self.recorded).sent.clone()
    }

    pub fn closed_count(&self) -> usize {
        lock(&self.recorded).closed
    }

    /// Deliver a message as if the server pushed it.
    pub async fn deliver(&self, conversation_id: ConversationId, message: Message) -> bool {
        let sender = lock(&self.recorded).inbound.clone();
        match sender {
            Some(sender) => sender
                .send(InboundEvent {
                    conversation_id,
                    message,
                })
                .await
                .is_ok(),
            None => false,
        }
    }
}

impl Transport for RecordingTransport {
    fn open(
        &self,
        conversation_id: ConversationId,
        inbound: mpsc::Sender<InboundEvent>,
    ) -> TransportFuture<'_, SyncResult<Box<dyn TransportChannel>>> {
        Box::pin(async move {
            if let Some(delay) = self.open_delays.get(&conversation_id) {
                tokio::time::sleep(*delay).await;
            }
            if self.fail_opens {
                return Err(SyncError::Transport("connection refused".to_string()));
            }
            let mut recorded = lock(&self.recorded);
            recorded.opened.push(conversation_id);
            recorded.inbound = Some(inbound);
            drop(recorded);
            Ok(Box::new(RecordingChannel {
                recorded: Arc::clone(&self.recorded),
                fail_sends: self.fail_sends,
                stall_sends: self.stall_sends,
            }) as Box<dyn TransportChannel>)
        })
    }
}

struct RecordingChannel {
    recorded: Arc<Mutex<Recorded>>,
    fail_sends: bool,
    stall_sends: bool,
}

impl TransportChannel for RecordingChannel {
    fn send<'a>(&'a self, message: &'a Message) -> TransportFuture<'a, SyncResult<()>> {
        Box::pin(async move {
            if self.stall_sends {
                futures::future::pending::<()>().await;
            }
            if self.fail_sends {
                return Err(SyncError::Transport("socket closed".to_string()));
            }
            lock(&self.recorded).sent.push(message.clone());
            Ok(())
        })
    }

    fn close(&self) {
        lock(&self.recorded).closed += 1;
    }
}
