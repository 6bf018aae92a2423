//! Configuration for the synchronization core.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::sync::core::errors::{SyncError, SyncResult};

/// Environment variable holding the Persistence API base URL.
pub const ENV_API_URL: &str = "CHAT_SYNC_API_URL";
/// Environment variable holding the push transport base URL.
pub const ENV_WS_URL: &str = "CHAT_SYNC_WS_URL";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "CHAT_SYNC_TIMEOUT_SECS";
/// Environment variable holding the inbound event buffer size.
pub const ENV_INBOUND_BUFFER: &str = "CHAT_SYNC_INBOUND_BUFFER";
/// Environment variable holding the user id used by the binary.
pub const ENV_USER_ID: &str = "CHAT_SYNC_USER_ID";

/// Top-level configuration for a chat sync client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the Persistence API (e.g. `http://host/api/`).
    pub api_base_url: String,
    /// Base URL of the per-conversation push channels (e.g. `ws://host/ws/chat/`).
    pub ws_base_url: String,
    /// Timeout for a single Persistence API request.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Timeout for establishing HTTP and WebSocket connections.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Upper bound on a single push send; a stalled push is abandoned after it.
    #[serde(with = "duration_serde")]
    pub push_timeout: Duration,
    /// Capacity of the inbound push event queue.
    pub inbound_buffer: usize,
    /// Capacity of each channel's outbound queue.
    pub outbound_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api/".to_string(),
            ws_base_url: "ws://127.0.0.1:8000/ws/chat/".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            push_timeout: Duration::from_secs(2),
            inbound_buffer: 256,
            outbound_buffer: 64,
        }
    }
}

impl SyncConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `CHAT_SYNC_*` environment variables over the defaults.
    ///
    /// # Errors
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL) {
            config.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_WS_URL) {
            config.ws_base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|err| {
                SyncError::InvalidConfig(format!("{ENV_TIMEOUT_SECS}={raw}: {err}"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(ENV_INBOUND_BUFFER) {
            config.inbound_buffer = raw.trim().parse::<usize>().map_err(|err| {
                SyncError::InvalidConfig(format!("{ENV_INBOUND_BUFFER}={raw}: {err}"))
            })?;
        }
        Ok(config)
    }

    /// Set the Persistence API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the push transport base URL.
    #[must_use]
    pub fn with_ws_base_url(mut self, url: impl Into<String>) -> Self {
        self.ws_base_url = url.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout used by both channels.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the push send timeout.
    #[must_use]
    pub const fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    /// Set the inbound event queue capacity.
    #[must_use]
    pub const fn with_inbound_buffer(mut self, capacity: usize) -> Self {
        self.inbound_buffer = capacity;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> SyncResult<()> {
        let api = self.api_url()?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(SyncError::InvalidConfig(format!(
                "api_base_url must be http(s), got {}",
                api.scheme()
            )));
        }

        let ws = self.ws_url()?;
        if !matches!(ws.scheme(), "ws" | "wss") {
            return Err(SyncError::InvalidConfig(format!(
                "ws_base_url must be ws(s), got {}",
                ws.scheme()
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(SyncError::InvalidConfig(
                "request_timeout must be > 0".to_string(),
            ));
        }

        if self.push_timeout.is_zero() {
            return Err(SyncError::InvalidConfig(
                "push_timeout must be > 0".to_string(),
            ));
        }

        if self.inbound_buffer == 0 {
            return Err(SyncError::InvalidConfig(
                "inbound_buffer must be > 0".to_string(),
            ));
        }

        if self.outbound_buffer == 0 {
            return Err(SyncError::InvalidConfig(
                "outbound_buffer must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed Persistence API base URL, always ending in `/`.
    ///
    /// # Errors
    /// Returns an error if the URL is malformed.
    pub fn api_url(&self) -> SyncResult<Url> {
        parse_base(&self.api_base_url)
    }

    /// Parsed push transport base URL, always ending in `/`.
    ///
    /// # Errors
    /// Returns an error if the URL is malformed.
    pub fn ws_url(&self) -> SyncResult<Url> {
        parse_base(&self.ws_base_url)
    }
}

/// Parse a base URL so relative joins append instead of replacing the last segment.
fn parse_base(raw: &str) -> SyncResult<Url> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
