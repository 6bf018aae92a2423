//! Startup helpers for the `chat-sync` binary.
//!
//! Loads configuration from the environment, lists the configured user's
//! conversations and logs a summary.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::sync::core::config::ENV_USER_ID;
use crate::sync::{ChatSync, SyncConfig, UserId};

/// Install the global tracing subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Read the user whose conversations are listed.
fn user_id_from_env() -> Option<UserId> {
    std::env::var(ENV_USER_ID).ok()?.parse().ok()
}

/// Run the binary.
///
/// # Returns
/// `ExitCode::SUCCESS` when the listing succeeds, `1` on configuration or
/// request failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();
    tracing::info!("Starting chat-sync v{}", env!("CARGO_PKG_VERSION"));

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let Some(user_id) = user_id_from_env() else {
        tracing::error!("{ENV_USER_ID} must be set to a numeric user id");
        return ExitCode::from(1);
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    rt.block_on(async move {
        let chat = match ChatSync::from_config(&config) {
            Ok(chat) => chat,
            Err(e) => {
                tracing::error!("Failed to build chat sync: {e}");
                return ExitCode::from(1);
            }
        };

        let code = match chat.orchestrator().fetch_user_conversations(user_id).await {
            Ok(conversations) => {
                tracing::info!(%user_id, count = conversations.len(), "Conversations loaded");
                for conversation in &conversations {
                    tracing::info!(
                        conversation_id = %conversation.id,
                        participants = conversation.participants.len(),
                        last_activity = ?conversation.last_activity,
                        "conversation"
                    );
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Failed to load conversations: {e}");
                ExitCode::from(1)
            }
        };

        chat.shutdown().await;
        code
    })
}
