// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat core: connection registry, per-connection session protocol, and
//! broadcast dispatch.
//!
//! This is a single-process broadcast domain. Connections held by another
//! process never see messages dispatched here.

pub mod dispatch;
pub mod registry;
pub mod session;

/// Identity attached to an authenticated chat connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}
