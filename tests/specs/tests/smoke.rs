// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `growchat` binary and exercise
//! health, history, and the chat WebSocket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use growchat_specs::ChatProcess;

const TIMEOUT: Duration = Duration::from_secs(10);

type Ws =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn join(chat: &ChatProcess, user_id: &str, username: &str) -> anyhow::Result<Ws> {
    let (mut ws, _) = tokio_tungstenite::connect_async(chat.ws_url()).await?;
    let auth = serde_json::json!({"type": "auth", "userId": user_id, "username": username});
    ws.send(Message::Text(auth.to_string().into())).await?;
    let ack = recv_json(&mut ws).await?;
    anyhow::ensure!(ack["type"] == "connected", "unexpected ack: {ack}");
    Ok(ws)
}

async fn say(ws: &mut Ws, content: &str) -> anyhow::Result<()> {
    let msg = serde_json::json!({"type": "message", "content": content});
    ws.send(Message::Text(msg.to_string().into())).await?;
    Ok(())
}

async fn recv_json(ws: &mut Ws) -> anyhow::Result<serde_json::Value> {
    loop {
        let msg = tokio::time::timeout(TIMEOUT, ws.next())
            .await
            .map_err(|_| anyhow::anyhow!("ws recv timeout"))?
            .ok_or_else(|| anyhow::anyhow!("ws stream closed"))??;
        if let Message::Text(text) = msg {
            return Ok(serde_json::from_str(&text)?);
        }
    }
}

async fn history(chat: &ChatProcess) -> anyhow::Result<Vec<serde_json::Value>> {
    let url = format!("{}/api/chat/messages", chat.base_url());
    Ok(reqwest::get(url).await?.json().await?)
}

// -- HTTP ---------------------------------------------------------------------

#[tokio::test]
async fn http_health() -> anyhow::Result<()> {
    let chat = ChatProcess::start()?;
    chat.wait_healthy(TIMEOUT).await?;

    let resp: serde_json::Value =
        reqwest::get(format!("{}/api/v1/health", chat.base_url())).await?.json().await?;
    assert_eq!(resp["status"], "running");
    assert_eq!(resp["connections"], 0);
    Ok(())
}

#[tokio::test]
async fn http_history_starts_empty() -> anyhow::Result<()> {
    let chat = ChatProcess::start()?;
    chat.wait_healthy(TIMEOUT).await?;
    assert!(history(&chat).await?.is_empty());
    Ok(())
}

// -- WebSocket ----------------------------------------------------------------

#[tokio::test]
async fn ws_chat_roundtrip() -> anyhow::Result<()> {
    let chat = ChatProcess::start()?;
    chat.wait_healthy(TIMEOUT).await?;

    let mut alice = join(&chat, "u1", "alice").await?;
    let mut bob = join(&chat, "u2", "bob").await?;

    say(&mut alice, "hello bob").await?;
    let to_alice = recv_json(&mut alice).await?;
    let to_bob = recv_json(&mut bob).await?;
    assert_eq!(to_alice, to_bob);
    assert_eq!(to_bob["type"], "message");
    assert_eq!(to_bob["data"]["username"], "alice");
    assert_eq!(to_bob["data"]["content"], "hello bob");

    let stored = history(&chat).await?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], to_bob["data"]);
    Ok(())
}

#[tokio::test]
async fn ws_token_required_when_secret_set() -> anyhow::Result<()> {
    let chat = ChatProcess::build().auth_secret("smoke-secret").spawn()?;
    chat.wait_healthy(TIMEOUT).await?;

    let (mut ws, _) = tokio_tungstenite::connect_async(chat.ws_url()).await?;
    let auth = serde_json::json!({"type": "auth", "userId": "u1", "username": "alice"});
    ws.send(Message::Text(auth.to_string().into())).await?;
    let reply = recv_json(&mut ws).await?;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["code"], "UNAUTHORIZED");

    let resp = reqwest::get(format!("{}/api/chat/messages", chat.base_url())).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    Ok(())
}

// -- Persistence --------------------------------------------------------------

#[tokio::test]
async fn history_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("chat.db");

    {
        let mut chat = ChatProcess::build().db_path(&db).spawn()?;
        chat.wait_healthy(TIMEOUT).await?;
        let mut alice = join(&chat, "u1", "alice").await?;
        say(&mut alice, "first").await?;
        recv_json(&mut alice).await?;
        say(&mut alice, "second").await?;
        recv_json(&mut alice).await?;
        drop(alice);
        chat.terminate(TIMEOUT).await?;
    }

    let chat = ChatProcess::build().db_path(&db).spawn()?;
    chat.wait_healthy(TIMEOUT).await?;
    let stored = history(&chat).await?;
    let contents: Vec<&str> = stored.iter().filter_map(|m| m["content"].as_str()).collect();
    assert_eq!(contents, vec!["second", "first"]);
    Ok(())
}

#[tokio::test]
async fn sigterm_exits_cleanly() -> anyhow::Result<()> {
    let mut chat = ChatProcess::start()?;
    chat.wait_healthy(TIMEOUT).await?;
    let _ws = join(&chat, "u1", "alice").await?;

    let status = chat.terminate(TIMEOUT).await?;
    assert!(status.success(), "exit status: {status}");
    Ok(())
}
