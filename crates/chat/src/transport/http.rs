// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the chat service.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::state::ChatState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<ChatState>>) -> impl IntoResponse {
    Json(HealthResponse { status: "running".to_owned(), connections: s.registry.len() })
}

/// `GET /api/chat/messages?limit=N`: recent messages, newest first.
pub async fn chat_messages(
    State(s): State<Arc<ChatState>>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = s.config.history_page(q.limit);
    match s.dispatcher.history(limit).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => {
            tracing::error!(err = %e, "failed to load chat history");
            ChatError::Internal.to_http_response("failed to load chat history").into_response()
        }
    }
}
