// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::chat::dispatch::Dispatcher;
use crate::chat::registry::ConnectionRegistry;
use crate::config::ChatConfig;
use crate::store::MessageLog;
use crate::transport::auth::TokenVerifier;

/// Shared server state.
pub struct ChatState {
    pub config: ChatConfig,
    /// Live authenticated chat connections.
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Dispatcher,
    /// Present when `--auth-secret` is set.
    pub verifier: Option<TokenVerifier>,
    pub shutdown: CancellationToken,
}

impl ChatState {
    pub fn new(config: ChatConfig, log: Arc<dyn MessageLog>, shutdown: CancellationToken) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Dispatcher::new(log, Arc::clone(&registry));
        let verifier = config.auth_secret.as_deref().map(TokenVerifier::new);
        Self { config, registry, dispatcher, verifier, shutdown }
    }
}
