// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed message log.
//!
//! Uses WAL mode for concurrent reads during writes. Timestamps are stored
//! as epoch millis; the rowid breaks ties between messages stored within the
//! same millisecond.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use super::{MessageLog, NewChatMessage};
use crate::frame::ChatMessage;

pub struct SqliteMessageLog {
    inner: Mutex<Inner>,
}

struct Inner {
    conn: Connection,
    /// Highest `created_at_ms` handed out so far.
    last_ms: i64,
}

impl SqliteMessageLog {
    /// Open (or create) the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database. Contents vanish with the process.
    pub fn open_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS chat_messages (
                seq           INTEGER PRIMARY KEY AUTOINCREMENT,
                id            TEXT NOT NULL UNIQUE,
                user_id       TEXT NOT NULL,
                username      TEXT NOT NULL,
                content       TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_messages_created
                ON chat_messages(created_at_ms DESC, seq DESC);
            ",
        )?;
        let last_ms: i64 = conn.query_row(
            "SELECT COALESCE(MAX(created_at_ms), 0) FROM chat_messages",
            [],
            |row| row.get(0),
        )?;
        Ok(Self { inner: Mutex::new(Inner { conn, last_ms }) })
    }

    /// Append with an explicit wall-clock reading.
    fn append_at(&self, msg: NewChatMessage, now: DateTime<Utc>) -> anyhow::Result<ChatMessage> {
        let mut inner = self.inner.lock();
        let created_ms = now.timestamp_millis().max(inner.last_ms);
        let created_at = from_millis(created_ms)?;
        let id = uuid::Uuid::new_v4().to_string();

        inner.conn.execute(
            "INSERT INTO chat_messages (id, user_id, username, content, created_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, msg.user_id, msg.username, msg.content, created_ms],
        )?;
        inner.last_ms = created_ms;

        Ok(ChatMessage {
            id,
            user_id: msg.user_id,
            username: msg.username,
            content: msg.content,
            created_at,
        })
    }
}

impl MessageLog for SqliteMessageLog {
    fn append(&self, msg: NewChatMessage) -> anyhow::Result<ChatMessage> {
        self.append_at(msg, Utc::now())
    }

    fn recent(&self, limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let inner = self.inner.lock();
        let mut stmt = inner.conn.prepare(
            "SELECT id, user_id, username, content, created_at_ms
             FROM chat_messages
             ORDER BY created_at_ms DESC, seq DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, username, content, created_ms) = row?;
            out.push(ChatMessage {
                id,
                user_id,
                username,
                content,
                created_at: from_millis(created_ms)?,
            });
        }
        Ok(out)
    }
}

fn from_millis(ms: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow::anyhow!("timestamp out of range: {ms}"))
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
