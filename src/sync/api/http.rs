//! JSON-over-HTTP implementation of the Persistence API.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::sync::api::{ApiFuture, PersistenceApi};
use crate::sync::core::config::SyncConfig;
use crate::sync::core::errors::{SyncError, SyncResult};
use crate::sync::core::ids::{ConversationId, UserId};
use crate::sync::core::model::{Conversation, Message, MessageDraft};

/// Error payload sent by the server on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// History payload: `{ "messages": [...] }`.
///
/// Items are kept raw so a missing `conversation_id` can be filled in from
/// the requested conversation before decoding.
#[derive(Debug, Deserialize)]
struct HistoryBody {
    #[serde(default)]
    messages: Vec<Value>,
}

impl HistoryBody {
    fn into_messages(self, conversation_id: ConversationId) -> SyncResult<Vec<Message>> {
        self.messages
            .into_iter()
            .map(|mut item| -> SyncResult<Message> {
                if let Value::Object(fields) = &mut item {
                    fields
                        .entry("conversation_id")
                        .or_insert_with(|| Value::from(conversation_id.get()));
                }
                Ok(serde_json::from_value(item)?)
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct CreateConversationBody<'a> {
    participants: &'a [UserId],
}

/// Persistence API client over reqwest.
#[derive(Clone)]
pub struct HttpPersistenceApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpPersistenceApi {
    /// Create a client for the configured base URL.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let base = config.api_url()?;
        let client = Self::build_client(config)?;
        Ok(Self { client, base })
    }

    /// Build an HTTP client with JSON defaults and configured timeouts.
    fn build_client(config: &SyncConfig) -> SyncResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()
            .map_err(SyncError::Http)
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        Ok(self.base.join(path)?)
    }
}

/// Decode a success body, or turn a failure status into [`SyncError::Rejected`].
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> SyncResult<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error);
        return Err(SyncError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}

impl PersistenceApi for HttpPersistenceApi {
    fn create_message<'a>(&'a self, draft: &'a MessageDraft) -> ApiFuture<'a, SyncResult<Message>> {
        Box::pin(async move {
            let url = self.endpoint("messages/")?;
            debug!(conversation_id = %draft.conversation_id, %url, "POST message");
            let response = self.client.post(url).json(draft).send().await?;
            read_json(response).await
        })
    }

    fn fetch_conversations(&self, user_id: UserId) -> ApiFuture<'_, SyncResult<Vec<Conversation>>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("users/{user_id}/conversations/"))?;
            debug!(%user_id, %url, "GET conversations");
            let response = self.client.get(url).send().await?;
            read_json(response).await
        })
    }

    fn fetch_conversation_history(
        &self,
        conversation_id: ConversationId,
    ) -> ApiFuture<'_, SyncResult<Vec<Message>>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("conversations/{conversation_id}/"))?;
            debug!(%conversation_id, %url, "GET history");
            let response = self.client.get(url).send().await?;
            let body: HistoryBody = read_json(response).await?;
            body.into_messages(conversation_id)
        })
    }

    fn create_conversation<'a>(
        &'a self,
        participants: &'a [UserId],
    ) -> ApiFuture<'a, SyncResult<Conversation>> {
        Box::pin(async move {
            let url = self.endpoint("conversations/create/")?;
            debug!(participants = participants.len(), %url, "POST conversation");
            let response = self
                .client
                .post(url)
                .json(&CreateConversationBody { participants })
                .send()
                .await?;
            read_json(response).await
        })
    }
}
