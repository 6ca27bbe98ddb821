// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::chat::Identity;
use crate::error::ChatError;
use crate::state::ChatState;

/// Claims carried by tokens from the journal's auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: u64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity { user_id: self.id.clone(), username: self.username.clone() }
    }
}

/// Verifies HS256 tokens against the shared secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

/// Validate a Bearer token from HTTP headers.
///
/// With no verifier configured every request passes.
pub fn validate_bearer(
    headers: &HeaderMap,
    verifier: Option<&TokenVerifier>,
) -> Result<Option<Claims>, ChatError> {
    let verifier = match verifier {
        Some(v) => v,
        None => return Ok(None),
    };

    let header =
        headers.get("authorization").and_then(|v| v.to_str().ok()).ok_or(ChatError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(ChatError::Unauthorized)?;

    match verifier.verify(token) {
        Ok(claims) => Ok(Some(claims)),
        Err(e) => {
            tracing::debug!(err = %e, "bearer token rejected");
            Err(ChatError::Unauthorized)
        }
    }
}

/// Axum middleware that enforces Bearer token authentication.
///
/// Exempt: `/api/v1/health` and WebSocket upgrades (`/ws/`), which
/// authenticate in-band with the auth frame.
pub async fn auth_layer(
    state: State<Arc<ChatState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if path == "/api/v1/health" || path.starts_with("/ws/") {
        return next.run(req).await;
    }

    if let Err(code) = validate_bearer(req.headers(), state.verifier.as_ref()) {
        return code.to_http_response("unauthorized").into_response();
    }

    next.run(req).await
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
