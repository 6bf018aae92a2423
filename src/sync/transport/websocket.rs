//! WebSocket push transport over tokio-tungstenite.
//!
//! One socket per conversation at `{ws_base}/{conversation_id}/`. Outgoing
//! frames go through a bounded queue drained by a writer task; a full queue
//! fails the send instead of waiting. A reader task decodes text frames and
//! forwards them as [`InboundEvent`]s.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::AbortHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use url::Url;

use crate::sync::core::config::SyncConfig;
use crate::sync::core::errors::{SyncError, SyncResult};
use crate::sync::core::ids::ConversationId;
use crate::sync::core::model::Message;
use crate::sync::transport::{InboundEvent, Transport, TransportChannel, TransportFuture};

/// Frames accepted from the server: an envelope or a bare message.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InboundFrame {
    Envelope {
        #[serde(default, alias = "conversationId")]
        conversation_id: Option<ConversationId>,
        message: Message,
    },
    Bare(Message),
}

/// Decode a text frame received on `channel`'s socket.
fn decode_frame(text: &str, channel: ConversationId) -> SyncResult<InboundEvent> {
    let event = match serde_json::from_str::<InboundFrame>(text)? {
        InboundFrame::Envelope {
            conversation_id,
            message,
        } => InboundEvent {
            conversation_id: conversation_id.unwrap_or(channel),
            message,
        },
        InboundFrame::Bare(message) => InboundEvent {
            conversation_id: channel,
            message,
        },
    };
    Ok(event)
}

/// Opens one WebSocket per conversation.
#[derive(Clone, Debug)]
pub struct WebSocketTransport {
    base: Url,
    connect_timeout: Duration,
    outbound_buffer: usize,
}

impl WebSocketTransport {
    /// Create a transport for the configured WebSocket base URL.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        Ok(Self {
            base: config.ws_url()?,
            connect_timeout: config.connect_timeout,
            outbound_buffer: config.outbound_buffer.max(1),
        })
    }

    /// Socket URL for a conversation.
    ///
    /// # Errors
    /// Returns an error if the joined URL is invalid.
    pub fn channel_url(&self, conversation_id: ConversationId) -> SyncResult<Url> {
        Ok(self.base.join(&format!("{conversation_id}/"))?)
    }
}

impl Transport for WebSocketTransport {
    fn open(
        &self,
        conversation_id: ConversationId,
        inbound: mpsc::Sender<InboundEvent>,
    ) -> TransportFuture<'_, SyncResult<Box<dyn TransportChannel>>> {
        Box::pin(async move {
            let url = self.channel_url(conversation_id)?;
            debug!(%conversation_id, %url, "connecting websocket");

            let (stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
                .await
                .map_err(|_| SyncError::Timeout(self.connect_timeout))??;
            let (mut sink, mut source) = stream.split();
            let (outbound, mut queue) = mpsc::channel::<String>(self.outbound_buffer);

            let writer = tokio::spawn(async move {
                while let Some(text) = queue.recv().await {
                    if let Err(err) = sink.send(WsMessage::Text(text)).await {
                        warn!(%conversation_id, %err, "websocket write failed");
                        break;
                    }
                }
                let _ = sink.close().await;
            });

            let reader = tokio::spawn(async move {
                while let Some(frame) = source.next().await {
                    match frame {
                        Ok(WsMessage::Text(text)) => match decode_frame(&text, conversation_id) {
                            Ok(event) => {
                                if inbound.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => warn!(%conversation_id, %err, "undecodable frame"),
                        },
                        Ok(WsMessage::Close(_)) => break,
                        Ok(_) => {}
                        Err(err) => {
                            warn!(%conversation_id, %err, "websocket read failed");
                            break;
                        }
                    }
                }
                debug!(%conversation_id, "websocket reader stopped");
            });

            info!(%conversation_id, "websocket connected");
            Ok(Box::new(WebSocketChannel {
                conversation_id,
                outbound,
                writer: writer.abort_handle(),
                reader: reader.abort_handle(),
            }) as Box<dyn TransportChannel>)
        })
    }
}

/// Live socket for one conversation.
struct WebSocketChannel {
    conversation_id: ConversationId,
    outbound: mpsc::Sender<String>,
    writer: AbortHandle,
    reader: AbortHandle,
}

impl TransportChannel for WebSocketChannel {
    fn send<'a>(&'a self, message: &'a Message) -> TransportFuture<'a, SyncResult<()>> {
        Box::pin(async move {
            let text = serde_json::to_string(message)?;
            self.outbound.try_send(text).map_err(|err| {
                let reason = match err {
                    TrySendError::Full(_) => "outbound queue full",
                    TrySendError::Closed(_) => "closed",
                };
                SyncError::Transport(format!("channel {} {reason}", self.conversation_id))
            })
        })
    }

    fn close(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;
    use crate::sync::core::model::MessageDraft;

    /// Accept one socket and echo every text frame back inside an envelope.
    async fn echo_server() -> Option<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
        let addr = listener.local_addr().ok()?;
        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                return;
            };
            while let Some(Ok(frame)) = ws.next().await {
                if let WsMessage::Text(text) = frame {
                    let message: Value = serde_json::from_str(&text).unwrap_or_default();
                    let envelope = json!({ "message": message });
                    if ws.send(WsMessage::Text(envelope.to_string())).await.is_err() {
                        break;
                    }
                }
            }
        });
        Some(format!("ws://{addr}/ws/chat"))
    }

    #[test]
    fn test_channel_url_appends_conversation() {
        let transport =
            WebSocketTransport::new(&SyncConfig::new().with_ws_base_url("ws://h/ws/chat"));
        let url = transport.and_then(|t| t.channel_url(ConversationId::new(7)));
        assert_eq!(
            url.ok().map(|u| u.to_string()),
            Some("ws://h/ws/chat/7/".to_string())
        );
    }

    #[test]
    fn test_decode_envelope_and_bare_frames() {
        let channel = ConversationId::new(3);

        let envelope = r#"{"conversation_id": 8, "message": {"conversation_id": 8, "text": "a"}}"#;
        let event = decode_frame(envelope, channel).ok();
        assert_eq!(event.map(|e| e.conversation_id), Some(ConversationId::new(8)));

        let bare = r#"{"id": 4, "conversation_id": 3, "content": "b"}"#;
        let event = decode_frame(bare, channel).ok();
        assert!(event.is_some_and(|e| e.conversation_id == channel && e.message.text == "b"));

        let no_conversation = r#"{"message": {"conversation_id": 3, "text": "c"}}"#;
        let event = decode_frame(no_conversation, channel).ok();
        assert_eq!(event.map(|e| e.conversation_id), Some(channel));

        assert!(decode_frame("not json", channel).is_err());
    }

    #[tokio::test]
    async fn test_round_trip_through_socket() {
        let Some(base) = echo_server().await else {
            panic!("echo server should start");
        };
        let Ok(transport) = WebSocketTransport::new(&SyncConfig::new().with_ws_base_url(base))
        else {
            panic!("transport should build");
        };
        let id = ConversationId::new(7);
        let (tx, mut rx) = mpsc::channel(8);

        let channel = match transport.open(id, tx).await {
            Ok(channel) => channel,
            Err(err) => panic!("open failed: {err}"),
        };
        let pending = MessageDraft::new(id, "hi").to_pending();
        assert!(channel.send(&pending).await.is_ok());

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        let Ok(Some(event)) = event else {
            panic!("expected an echoed frame");
        };
        assert_eq!(event.conversation_id, id);
        assert_eq!(event.message.client_ref, pending.client_ref);
        assert_eq!(event.message.text, "hi");

        channel.close();
    }

    #[tokio::test]
    async fn test_full_outbound_queue_fails_fast() {
        let (outbound, _queue) = mpsc::channel(1);
        let channel = WebSocketChannel {
            conversation_id: ConversationId::new(7),
            outbound,
            writer: tokio::spawn(async {}).abort_handle(),
            reader: tokio::spawn(async {}).abort_handle(),
        };
        let pending = MessageDraft::new(ConversationId::new(7), "hi").to_pending();

        assert!(channel.send(&pending).await.is_ok());
        let second = tokio::time::timeout(Duration::from_secs(1), channel.send(&pending)).await;

        assert!(matches!(second, Ok(Err(SyncError::Transport(_)))));
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces_error() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind should succeed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("local addr");
        };
        drop(listener);
        let config = SyncConfig::new()
            .with_ws_base_url(format!("ws://{addr}/ws/chat"))
            .with_connect_timeout(Duration::from_secs(2));
        let Ok(transport) = WebSocketTransport::new(&config) else {
            panic!("transport should build");
        };
        let (tx, _rx) = mpsc::channel(1);

        assert!(transport.open(ConversationId::new(1), tx).await.is_err());
    }
}
