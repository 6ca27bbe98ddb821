// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent message log.

pub mod sqlite;

use crate::frame::ChatMessage;

/// A message accepted from an authenticated connection, before the log has
/// assigned it an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub user_id: String,
    pub username: String,
    pub content: String,
}

/// Append-only store of chat messages.
///
/// Implementations are blocking; async callers go through
/// `tokio::task::spawn_blocking`.
pub trait MessageLog: Send + Sync + 'static {
    /// Append one message, returning it with its assigned id and timestamp.
    /// Timestamps never decrease across successive appends.
    fn append(&self, msg: NewChatMessage) -> anyhow::Result<ChatMessage>;

    /// Return up to `limit` most recent messages, newest first.
    fn recent(&self, limit: usize) -> anyhow::Result<Vec<ChatMessage>>;
}
