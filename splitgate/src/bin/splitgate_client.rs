// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// splitgate-client: send one prompt through the gateway and print events.
//
// Usage:
//   splitgate-client --prompt "hi"
//   splitgate-client --mode split_markers --base-url http://127.0.0.1:9000

use clap::Parser;
use futures_util::TryStreamExt;
use serde_json::json;

use splitgate::client::{read_events, Transcript};
use splitgate::upstream::UpstreamError;

#[derive(Parser)]
#[command(
    name = "splitgate-client",
    about = "Stream a chat completion through splitgate and print the derived events."
)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:9000")]
    base_url: String,

    #[arg(long, default_value = "hi")]
    prompt: String,

    #[arg(long, default_value = "x")]
    model: String,

    /// Scenario forwarded to the upstream (normal, no_reasoning, split_markers).
    #[arg(long, default_value = "normal")]
    mode: String,
}

#[derive(Debug, thiserror::Error)]
enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway answered {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Stream(#[from] UpstreamError),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tokio::select! {
        result = run(&cli) => {
            if let Err(e) = result {
                eprintln!("Client error: {e}");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted.");
        }
    }
}

async fn run(cli: &Cli) -> Result<(), ClientError> {
    let url = format!("{}/chat/completions", cli.base_url.trim_end_matches('/'));
    let payload = json!({
        "model": cli.model,
        "stream": true,
        "mode": cli.mode,
        "messages": [{"role": "user", "content": cli.prompt}],
    });

    let resp = reqwest::Client::new().post(&url).json(&payload).send().await?;
    if !resp.status().is_success() {
        return Err(ClientError::Status(resp.status()));
    }

    let body = resp
        .bytes_stream()
        .map_err(|e| UpstreamError::Transport(e.to_string()));
    let transcript = read_events(Box::pin(body), |event| {
        println!(
            "[{}] {}",
            event.event.as_deref().unwrap_or("None"),
            event.data
        );
    })
    .await?;

    print_final(&transcript);
    Ok(())
}

fn print_final(transcript: &Transcript) {
    let text = transcript.final_text.trim();
    println!("\n--- FINAL OUTPUT ---");
    println!("{}", if text.is_empty() { "(empty)" } else { text });
}
