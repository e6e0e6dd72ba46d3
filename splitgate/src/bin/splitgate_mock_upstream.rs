// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// splitgate-mock-upstream: scripted completion service for local runs.
//
// Usage:
//   splitgate-mock-upstream --port 8001
//   splitgate-mock-upstream --chunk-delay-ms 0

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use splitgate::mock_upstream::{self, DEFAULT_CHUNK_DELAY};

#[derive(Parser)]
#[command(
    name = "splitgate-mock-upstream",
    about = "Scripted upstream that streams double-wrapped SSE completion chunks."
)]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    #[arg(long, default_value_t = 8001)]
    port: u16,

    /// Pause between streamed chunks, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_CHUNK_DELAY.as_millis() as u64)]
    chunk_delay_ms: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let addr = SocketAddr::new(cli.host, cli.port);
    let app = mock_upstream::build_mock_router(Duration::from_millis(cli.chunk_delay_ms));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, "failed to bind: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "mock upstream listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
