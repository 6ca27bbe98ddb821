// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

/// Configuration for the growchat server.
#[derive(Debug, Clone, Parser)]
#[command(name = "growchat", version, about = "Real-time chat service for the growth journal")]
pub struct ChatConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "GROWCHAT_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9870, env = "GROWCHAT_PORT")]
    pub port: u16,

    /// SQLite database file for the message log. In-memory when unset.
    #[arg(long, env = "GROWCHAT_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// HS256 secret shared with the auth service. When unset, the identity
    /// asserted in the chat auth frame is trusted as-is.
    #[arg(long, env = "GROWCHAT_AUTH_SECRET", hide_env_values = true)]
    pub auth_secret: Option<String>,

    /// Default number of messages returned by the history endpoint.
    #[arg(long, default_value_t = 50, env = "GROWCHAT_HISTORY_LIMIT")]
    pub history_limit: usize,

    /// Upper bound on a caller-requested history limit.
    #[arg(long, default_value_t = 500, env = "GROWCHAT_HISTORY_MAX")]
    pub history_max: usize,

    /// Per-connection outbound frame queue depth. A client that falls this
    /// many frames behind on reading misses broadcasts until it catches up.
    #[arg(long, default_value_t = 64, env = "GROWCHAT_OUTBOUND_BUFFER")]
    pub outbound_buffer: usize,

    /// Maximum chat message content length in bytes.
    #[arg(long, default_value_t = 4000, env = "GROWCHAT_MAX_CONTENT_LEN")]
    pub max_content_len: usize,

    /// Send an error frame back to the sender when a message cannot be stored.
    #[arg(long, env = "GROWCHAT_REPORT_SEND_ERRORS")]
    pub report_send_errors: bool,

    /// Log format (text or json).
    #[arg(long, env = "GROWCHAT_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "GROWCHAT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ChatConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.history_limit == 0 {
            anyhow::bail!("--history-limit must be at least 1");
        }
        if self.history_limit > self.history_max {
            anyhow::bail!(
                "--history-limit ({}) exceeds --history-max ({})",
                self.history_limit,
                self.history_max
            );
        }
        if self.outbound_buffer == 0 {
            anyhow::bail!("--outbound-buffer must be at least 1");
        }
        if self.max_content_len == 0 {
            anyhow::bail!("--max-content-len must be at least 1");
        }
        if self.auth_secret.as_deref().is_some_and(str::is_empty) {
            anyhow::bail!("--auth-secret must not be empty");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("unknown log format: {other}"),
        }
        Ok(())
    }

    /// Resolve the history page size for a caller-supplied limit.
    pub fn history_page(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.history_limit).min(self.history_max)
    }

    /// A config suitable for tests: ephemeral port, in-memory log, no auth.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 0,
            db_path: None,
            auth_secret: None,
            history_limit: 50,
            history_max: 500,
            outbound_buffer: 64,
            max_content_len: 4000,
            report_send_errors: false,
            log_format: "text".to_owned(),
            log_level: "warn".to_owned(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
