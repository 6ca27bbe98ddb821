// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat WebSocket endpoint.
//!
//! Each socket runs two halves: a writer task that drains the connection's
//! outbound queue into the socket, and the reader loop that feeds inbound
//! frames to the session. A reader parked on a dispatch never stops the
//! writer from draining broadcasts from other connections.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::chat::registry::ConnectionId;
use crate::chat::session::ChatSession;
use crate::state::ChatState;

/// `GET /ws/chat`: WebSocket upgrade for the chat room.
pub async fn ws_chat_handler(
    State(state): State<Arc<ChatState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat_socket(state, socket))
}

async fn handle_chat_socket(state: Arc<ChatState>, socket: WebSocket) {
    let (ws_tx, mut ws_rx) = socket.split();
    let (out_tx, out_rx) = mpsc::channel(state.config.outbound_buffer);
    let mut session = ChatSession::new(Arc::clone(&state), out_tx);
    let conn = session.id();
    tracing::debug!(conn, "chat socket opened");

    // Cancelled on server shutdown, or by the writer when the socket stops
    // accepting writes.
    let closed = state.shutdown.child_token();
    let writer = tokio::spawn(write_outbound(conn, ws_tx, out_rx, closed.clone()));

    loop {
        tokio::select! {
            _ = closed.cancelled() => break,

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        session.handle_text(text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::warn!(conn, "discarding binary chat frame");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(conn, err = %e, "chat socket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::debug!(conn, "chat socket closed");
    // Unregisters before the writer goes away, so no broadcast targets a
    // connection without a writer.
    drop(session);
    closed.cancel();
    if let Err(e) = writer.await {
        tracing::debug!(conn, err = %e, "chat writer task failed");
    }
}

/// Forward queued frames to the socket until the connection closes.
async fn write_outbound(
    conn: ConnectionId,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<Utf8Bytes>,
    closed: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            frame = out_rx.recv() => {
                let Some(text) = frame else { break };
                if let Err(e) = ws_tx.send(Message::Text(text)).await {
                    tracing::debug!(conn, err = %e, "chat socket write failed");
                    closed.cancel();
                    break;
                }
            }
            _ = closed.cancelled() => break,
        }
    }

    if let Err(e) = ws_tx.close().await {
        tracing::debug!(conn, err = %e, "chat socket close failed");
    }
}
