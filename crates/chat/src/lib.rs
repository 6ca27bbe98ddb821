// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Growchat: real-time chat room for the growth journal.

pub mod chat;
pub mod config;
pub mod error;
pub mod frame;
pub mod state;
pub mod store;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ChatConfig;
use crate::state::ChatState;
use crate::store::sqlite::SqliteMessageLog;
use crate::store::MessageLog;
use crate::transport::build_router;

/// Initialize tracing/logging from config.
///
/// Uses `try_init` so it's safe to call multiple times (e.g. from tests).
pub fn init_tracing(config: &ChatConfig) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// Open the message log named by the config.
pub fn open_log(config: &ChatConfig) -> anyhow::Result<Arc<dyn MessageLog>> {
    match config.db_path {
        Some(ref path) => {
            info!(path = %path.display(), "opening chat message log");
            Ok(Arc::new(SqliteMessageLog::open(path)?))
        }
        None => {
            warn!("no --db-path given, chat history will not survive a restart");
            Ok(Arc::new(SqliteMessageLog::open_memory()?))
        }
    }
}

/// Run the chat server until shutdown.
pub async fn run(config: ChatConfig) -> anyhow::Result<()> {
    config.validate()?;
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let log = open_log(&config)?;
    if config.auth_secret.is_none() {
        warn!("no --auth-secret given, chat identities are taken from clients unverified");
    }

    let state = Arc::new(ChatState::new(config, log, shutdown.clone()));
    spawn_signal_handler(shutdown.clone());

    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    info!("growchat listening on {}", listener.local_addr()?);
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    let dropped = state.registry.clear();
    info!(dropped, "growchat stopped");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGTERM");
                shutdown.cancel();
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGINT");
                shutdown.cancel();
            }
        }
    });
}
