// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the chat channel and history API.
//!
//! Frames are internally-tagged JSON objects (`{"type": "auth", ...}`). Field
//! names are camelCase to match the web client.

use axum::extract::ws::Utf8Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// A persisted chat message. Immutable once the log has assigned its id and
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Auth {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Message {
        content: String,
    },
}

impl ClientFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::Message { .. } => "message",
        }
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Connected { message: String },
    Message { data: ChatMessage },
    Error { code: String, message: String },
}

impl ServerFrame {
    pub fn connected() -> Self {
        Self::Connected { message: "Connected to chat".to_owned() }
    }

    pub fn error(code: ChatError, message: impl Into<String>) -> Self {
        let body = code.to_error_body(message);
        Self::Error { code: body.code, message: body.message }
    }

    /// Serialize once for delivery; the result is cheap to clone per recipient.
    pub fn encode(&self) -> anyhow::Result<Utf8Bytes> {
        Ok(Utf8Bytes::from(serde_json::to_string(self)?))
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
