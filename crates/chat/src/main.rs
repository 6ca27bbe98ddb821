// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use growchat::config::ChatConfig;

#[tokio::main]
async fn main() {
    let config = ChatConfig::parse();
    growchat::init_tracing(&config);

    if let Err(e) = growchat::run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
