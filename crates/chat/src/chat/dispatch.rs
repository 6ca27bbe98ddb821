// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast dispatcher: one accepted chat frame becomes one stored message
//! and zero or more delivered copies.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::registry::{ConnectionRegistry, DeliveryError};
use super::Identity;
use crate::frame::{ChatMessage, ServerFrame};
use crate::store::{MessageLog, NewChatMessage};

/// Result of a successful dispatch.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: ChatMessage,
    /// Connections in the registry snapshot at fan-out time.
    pub recipients: usize,
    /// Connections whose queue accepted the frame.
    pub delivered: usize,
}

pub struct Dispatcher {
    log: Arc<dyn MessageLog>,
    registry: Arc<ConnectionRegistry>,
    /// Held across append + fan-out so broadcast order matches append order.
    order: Mutex<()>,
}

impl Dispatcher {
    pub fn new(log: Arc<dyn MessageLog>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { log, registry, order: Mutex::new(()) }
    }

    /// Store a message, then broadcast it to every registered connection,
    /// the author's own included.
    ///
    /// An `Err` means nothing was stored and nothing was broadcast.
    pub async fn dispatch(&self, author: &Identity, content: String) -> anyhow::Result<Delivery> {
        let _order = self.order.lock().await;

        let log = Arc::clone(&self.log);
        let new = NewChatMessage {
            user_id: author.user_id.clone(),
            username: author.username.clone(),
            content,
        };
        let message = tokio::task::spawn_blocking(move || log.append(new)).await??;

        let frame = ServerFrame::Message { data: message.clone() }.encode()?;
        let recipients = self.registry.snapshot();
        let mut delivered = 0;
        for conn in &recipients {
            match conn.deliver(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Closed) => {
                    debug!(conn = conn.id, "recipient closed during broadcast");
                }
                Err(DeliveryError::Full) => {
                    warn!(
                        conn = conn.id,
                        user_id = %conn.identity.user_id,
                        "slow consumer, queue full, dropping broadcast"
                    );
                }
            }
        }

        debug!(
            msg_id = %message.id,
            recipients = recipients.len(),
            delivered,
            "broadcast chat message"
        );
        Ok(Delivery { message, recipients: recipients.len(), delivered })
    }

    /// Most recent `limit` messages, newest first.
    pub async fn history(&self, limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
        let log = Arc::clone(&self.log);
        tokio::task::spawn_blocking(move || log.recent(limit)).await?
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
