// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::Identity;

/// Process-unique id for one streaming channel.
pub type ConnectionId = u64;

/// An open, authenticated chat channel.
#[derive(Debug)]
pub struct LiveConnection {
    pub id: ConnectionId,
    pub identity: Identity,
    outbound: mpsc::Sender<Utf8Bytes>,
}

/// Why a frame did not reach a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Outbound queue full. Each socket's writer drains its queue on its own
    /// task, so this only happens to a client that is not reading its socket.
    /// Such a slow consumer loses the frame; its connection stays open.
    Full,
    /// The connection's writer has gone away.
    Closed,
}

impl LiveConnection {
    pub fn new(id: ConnectionId, identity: Identity, outbound: mpsc::Sender<Utf8Bytes>) -> Self {
        Self { id, identity, outbound }
    }

    /// Queue an encoded frame without waiting.
    pub fn deliver(&self, frame: Utf8Bytes) -> Result<(), DeliveryError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Live set of authenticated chat connections for this process.
///
/// Lock sections are short and never span an `.await`; fan-out works on a
/// [`snapshot`](Self::snapshot) copy.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    live: RwLock<HashMap<ConnectionId, Arc<LiveConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a newly opened channel.
    pub fn next_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn register(&self, conn: LiveConnection) -> Arc<LiveConnection> {
        let conn = Arc::new(conn);
        self.live.write().insert(conn.id, Arc::clone(&conn));
        conn
    }

    /// Remove a connection. Returns false if it was not present.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.live.write().remove(&id).is_some()
    }

    pub fn snapshot(&self) -> Vec<Arc<LiveConnection>> {
        self.live.read().values().cloned().collect()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.live.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.live.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.read().is_empty()
    }

    /// Drop every connection. Used on shutdown.
    pub fn clear(&self) -> usize {
        let mut live = self.live.write();
        let n = live.len();
        live.clear();
        n
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
