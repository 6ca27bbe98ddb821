// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `growchat` binary as a subprocess and exercises it over
//! HTTP and WebSocket.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Once;
use std::time::Duration;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times, only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Resolve the path to the compiled `growchat` binary.
pub fn growchat_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("growchat")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// A running `growchat` process that is killed on drop.
pub struct ChatProcess {
    child: Child,
    port: u16,
}

/// Builder for a [`ChatProcess`].
///
/// By default the message log is in memory and identities are unverified.
#[derive(Default)]
pub struct ChatBuilder {
    db_path: Option<PathBuf>,
    auth_secret: Option<String>,
}

impl ChatBuilder {
    /// Persist messages to `path` (`--db-path`).
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Require signed tokens (`--auth-secret`).
    pub fn auth_secret(mut self, secret: &str) -> Self {
        self.auth_secret = Some(secret.to_owned());
        self
    }

    pub fn spawn(self) -> anyhow::Result<ChatProcess> {
        ensure_crypto();
        let binary = growchat_binary();
        anyhow::ensure!(binary.exists(), "growchat binary not found at {}", binary.display());

        let port = free_port()?;
        let mut args: Vec<String> = vec![
            "--host".into(),
            "127.0.0.1".into(),
            "--port".into(),
            port.to_string(),
            "--log-format".into(),
            "text".into(),
            "--log-level".into(),
            "warn".into(),
        ];
        if let Some(ref path) = self.db_path {
            args.extend(["--db-path".into(), path.to_string_lossy().into_owned()]);
        }
        if let Some(ref secret) = self.auth_secret {
            args.extend(["--auth-secret".into(), secret.clone()]);
        }

        let mut cmd = Command::new(&binary);
        // Keep the caller's environment from leaking into the flags.
        for var in ["GROWCHAT_DB_PATH", "GROWCHAT_AUTH_SECRET", "GROWCHAT_REPORT_SEND_ERRORS"] {
            cmd.env_remove(var);
        }
        let child = cmd.args(&args).stdout(Stdio::null()).stderr(Stdio::null()).spawn()?;

        Ok(ChatProcess { child, port })
    }
}

impl ChatProcess {
    /// Create a builder for custom configuration.
    pub fn build() -> ChatBuilder {
        ChatBuilder::default()
    }

    /// Spawn growchat with an in-memory log.
    pub fn start() -> anyhow::Result<Self> {
        Self::build().spawn()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL for HTTP requests.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Chat WebSocket URL.
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws/chat", self.port)
    }

    /// Poll health until responsive.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/api/v1/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("growchat did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Send SIGTERM and wait for the process to exit within `timeout`.
    pub async fn terminate(&mut self, timeout: Duration) -> anyhow::Result<std::process::ExitStatus> {
        let status = Command::new("kill").arg("-TERM").arg(self.child.id().to_string()).status()?;
        anyhow::ensure!(status.success(), "kill -TERM failed: {status}");
        self.wait_exit(timeout).await
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(
        &mut self,
        timeout: Duration,
    ) -> anyhow::Result<std::process::ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("growchat did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for ChatProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
