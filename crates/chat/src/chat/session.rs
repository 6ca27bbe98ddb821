// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection chat protocol.
//!
//! A session starts `Unauthenticated`. The first valid auth frame registers
//! it and moves it to `Authenticated`, where it stays until the channel
//! closes. Dropping the session unregisters it, whatever the state.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::registry::{ConnectionId, LiveConnection};
use super::Identity;
use crate::error::ChatError;
use crate::frame::{ClientFrame, ServerFrame};
use crate::state::ChatState;

enum Phase {
    Unauthenticated,
    Authenticated(Arc<LiveConnection>),
}

/// What became of one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Auth accepted; the connection is now registered.
    Authenticated,
    /// Auth frame carried a missing or invalid token.
    AuthRejected,
    /// Message stored and broadcast.
    Dispatched,
    /// Message rejected before storage (blank or oversized content).
    Rejected,
    /// Message could not be stored; nothing was broadcast.
    Failed,
    /// Valid frame received in the wrong state.
    Ignored,
    /// Unparseable or incomplete frame.
    Malformed,
}

pub struct ChatSession {
    id: ConnectionId,
    state: Arc<ChatState>,
    outbound: mpsc::Sender<Utf8Bytes>,
    phase: Phase,
}

impl ChatSession {
    pub fn new(state: Arc<ChatState>, outbound: mpsc::Sender<Utf8Bytes>) -> Self {
        let id = state.registry.next_id();
        Self { id, state, outbound, phase: Phase::Unauthenticated }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.phase {
            Phase::Authenticated(conn) => Some(&conn.identity),
            Phase::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, Phase::Authenticated(_))
    }

    /// Process one text frame from the client.
    pub async fn handle_text(&mut self, text: &str) -> FrameOutcome {
        let frame = match ClientFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(conn = self.id, err = %e, "discarding malformed chat frame");
                return FrameOutcome::Malformed;
            }
        };
        debug!(conn = self.id, kind = frame.kind(), "chat frame");

        match frame {
            ClientFrame::Auth { user_id, username, token } => {
                if self.is_authenticated() {
                    debug!(conn = self.id, "ignoring auth frame on authenticated connection");
                    return FrameOutcome::Ignored;
                }
                self.authenticate(user_id, username, token)
            }
            ClientFrame::Message { content } => {
                let conn = match &self.phase {
                    Phase::Authenticated(conn) => Arc::clone(conn),
                    Phase::Unauthenticated => {
                        debug!(conn = self.id, "ignoring chat message before auth");
                        return FrameOutcome::Ignored;
                    }
                };
                self.send_message(&conn, content).await
            }
        }
    }

    fn authenticate(
        &mut self,
        user_id: Option<String>,
        username: Option<String>,
        token: Option<String>,
    ) -> FrameOutcome {
        let identity = match &self.state.verifier {
            Some(verifier) => {
                let Some(token) = token else {
                    self.reply(ServerFrame::error(ChatError::Unauthorized, "token required"));
                    return FrameOutcome::AuthRejected;
                };
                match verifier.verify(&token) {
                    Ok(claims) => claims.identity(),
                    Err(e) => {
                        warn!(conn = self.id, err = %e, "chat auth token rejected");
                        self.reply(ServerFrame::error(ChatError::Unauthorized, "invalid token"));
                        return FrameOutcome::AuthRejected;
                    }
                }
            }
            None => match (user_id, username) {
                (Some(user_id), Some(username)) if !user_id.is_empty() && !username.is_empty() => {
                    Identity { user_id, username }
                }
                _ => {
                    warn!(conn = self.id, "discarding auth frame without identity");
                    return FrameOutcome::Malformed;
                }
            },
        };

        info!(
            conn = self.id,
            user_id = %identity.user_id,
            username = %identity.username,
            "chat connection authenticated"
        );
        let conn = self.state.registry.register(LiveConnection::new(
            self.id,
            identity,
            self.outbound.clone(),
        ));
        self.phase = Phase::Authenticated(conn);
        self.reply(ServerFrame::connected());
        FrameOutcome::Authenticated
    }

    async fn send_message(&self, conn: &LiveConnection, content: String) -> FrameOutcome {
        if content.trim().is_empty() {
            debug!(conn = self.id, "ignoring blank chat message");
            return FrameOutcome::Rejected;
        }
        let max = self.state.config.max_content_len;
        if content.len() > max {
            warn!(conn = self.id, len = content.len(), max, "chat message too long");
            if self.state.config.report_send_errors {
                self.reply(ServerFrame::error(
                    ChatError::BadRequest,
                    format!("message exceeds {max} bytes"),
                ));
            }
            return FrameOutcome::Rejected;
        }

        match self.state.dispatcher.dispatch(&conn.identity, content).await {
            Ok(_) => FrameOutcome::Dispatched,
            Err(e) => {
                error!(
                    conn = self.id,
                    user_id = %conn.identity.user_id,
                    err = %e,
                    "failed to store chat message"
                );
                if self.state.config.report_send_errors {
                    self.reply(ServerFrame::error(
                        ChatError::PersistFailed,
                        "message could not be saved",
                    ));
                }
                FrameOutcome::Failed
            }
        }
    }

    /// Queue a frame for this connection only.
    fn reply(&self, frame: ServerFrame) {
        match frame.encode() {
            Ok(text) => {
                if self.outbound.try_send(text).is_err() {
                    debug!(conn = self.id, "reply dropped, outbound queue unavailable");
                }
            }
            Err(e) => error!(conn = self.id, err = %e, "failed to encode reply"),
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        if let Phase::Authenticated(conn) = &self.phase {
            if self.state.registry.unregister(conn.id) {
                info!(conn = conn.id, user_id = %conn.identity.user_id, "chat connection closed");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
