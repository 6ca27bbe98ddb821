// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: state builder, failing log, token helpers.

use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header};
use tokio_util::sync::CancellationToken;

use crate::config::ChatConfig;
use crate::frame::ChatMessage;
use crate::state::ChatState;
use crate::store::sqlite::SqliteMessageLog;
use crate::store::{MessageLog, NewChatMessage};
use crate::transport::auth::Claims;

/// Builder for constructing `ChatState` in tests with sensible defaults.
pub struct ChatStateBuilder {
    config: ChatConfig,
    log: Option<Arc<dyn MessageLog>>,
}

impl Default for ChatStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStateBuilder {
    pub fn new() -> Self {
        Self { config: ChatConfig::for_tests(), log: None }
    }

    pub fn auth_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth_secret = Some(secret.into());
        self
    }

    pub fn max_content_len(mut self, n: usize) -> Self {
        self.config.max_content_len = n;
        self
    }

    pub fn outbound_buffer(mut self, depth: usize) -> Self {
        self.config.outbound_buffer = depth;
        self
    }

    pub fn report_send_errors(mut self, on: bool) -> Self {
        self.config.report_send_errors = on;
        self
    }

    pub fn history(mut self, default_limit: usize, max: usize) -> Self {
        self.config.history_limit = default_limit;
        self.config.history_max = max;
        self
    }

    pub fn log(mut self, log: Arc<dyn MessageLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn build(self) -> anyhow::Result<Arc<ChatState>> {
        let log = match self.log {
            Some(log) => log,
            None => Arc::new(SqliteMessageLog::open_memory()?),
        };
        Ok(Arc::new(ChatState::new(self.config, log, CancellationToken::new())))
    }
}

/// A message log whose every operation fails.
pub struct FailingLog;

impl MessageLog for FailingLog {
    fn append(&self, _msg: NewChatMessage) -> anyhow::Result<ChatMessage> {
        anyhow::bail!("disk on fire")
    }

    fn recent(&self, _limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
        anyhow::bail!("disk on fire")
    }
}

fn sign(secret: &str, id: &str, username: &str, exp: u64) -> anyhow::Result<String> {
    let claims = Claims {
        id: id.to_owned(),
        username: username.to_owned(),
        email: Some(format!("{username}@example.com")),
        exp,
    };
    Ok(jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Issue a token valid for one hour, as the auth service would.
pub fn issue_token(secret: &str, id: &str, username: &str) -> anyhow::Result<String> {
    sign(secret, id, username, now_secs() + 3600)
}

/// Issue a token that expired an hour ago.
pub fn expired_token(secret: &str, id: &str, username: &str) -> anyhow::Result<String> {
    sign(secret, id, username, now_secs().saturating_sub(3600))
}

/// Spawn an HTTP server on a random port for integration testing.
///
/// Returns the bound address and a join handle for the server task.
pub async fn spawn_http_server(
    state: Arc<ChatState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let shutdown = state.shutdown.clone();
    let router = crate::transport::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await;
    });
    Ok((addr, handle))
}
