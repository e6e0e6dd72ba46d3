// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use splitgate::config::{self, EnvSource};
use splitgate::proxy;
use splitgate::upstream::{ReqwestUpstreamClient, UpstreamClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "splitgate",
    about = "Reasoning-aware SSE gateway for token-streaming completion services"
)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = proxy::DEFAULT_HOST, env = "SPLITGATE_HOST")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = proxy::DEFAULT_PORT, env = "SPLITGATE_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let addr = SocketAddr::new(cli.host, cli.port);

    let config = match config::load_config(&EnvSource) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        upstream = %config.upstream_base_url,
        reasoning_start = %config.reasoning_start,
        reasoning_end = %config.reasoning_end,
        max_reasoning_chars = config.max_reasoning_chars,
        max_buffered_final_chars = config.max_buffered_final_chars,
        "config loaded"
    );

    let upstream: Arc<dyn UpstreamClient> = Arc::new(ReqwestUpstreamClient::new(
        reqwest::Client::new(),
        config.upstream_url(),
    ));
    let app = proxy::build_router(config, upstream);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, "failed to bind: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "splitgate listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("received Ctrl+C, shutting down");
    }
}
