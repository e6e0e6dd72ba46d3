// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Mock upstream
//
// A scripted stand-in for the completion service. Each chunk is sent as
// an SSE `message` event whose data is itself an OpenAI `data:` line,
// which is the double-wrapped framing the gateway's extractor unwraps.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::stream::{self, StreamExt};
use serde_json::json;

use crate::message::ChatRequest;

/// Pause between chunks when none is configured.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(150);

/// Scripted scenarios, selected by the request's `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    /// Reasoning wrapped in intact markers, then the answer.
    Normal,
    /// The answer only.
    NoReasoning,
    /// Like `Normal`, with each marker cut across two chunks.
    SplitMarkers,
}

impl MockMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "normal" => Some(MockMode::Normal),
            "no_reasoning" => Some(MockMode::NoReasoning),
            "split_markers" => Some(MockMode::SplitMarkers),
            _ => None,
        }
    }

    pub fn chunks(self) -> &'static [&'static str] {
        match self {
            MockMode::Normal => &[
                "<think>",
                "I should greet in one sentence. ",
                "Keep it short. ",
                "</think>",
                "Hi! Nice to meet you.",
            ],
            MockMode::NoReasoning => &["Hi! Nice to meet you."],
            MockMode::SplitMarkers => &[
                "<thi",
                "nk>",
                "I should greet in one sentence. ",
                "Keep it short. ",
                "</th",
                "ink>",
                "Hi! Nice to meet you.",
            ],
        }
    }
}

/// Encode one chunk in the upstream's double-wrapped framing.
pub fn wrap_chunk(text: &str) -> String {
    let inner = json!({"choices": [{"delta": {"content": text}}]});
    format!("event: message\ndata: data: {inner}\n\n")
}

/// The wrapped end-of-stream event.
pub fn wrapped_done() -> String {
    "event: message\ndata: data: [DONE]\n\n".to_string()
}

#[derive(Clone)]
struct MockState {
    chunk_delay: Duration,
}

fn mock_error(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
}

async fn mock_chat_completions(State(state): State<MockState>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return mock_error(format!("invalid request body: {e}")),
    };
    if !request.stream {
        return mock_error("mock upstream supports only stream=true".to_string());
    }

    let mode_name = request.mode.as_deref().unwrap_or("normal");
    let Some(mode) = MockMode::parse(mode_name) else {
        return mock_error(format!("unknown mode: {mode_name}"));
    };
    tracing::debug!(mode = mode_name, "mock upstream streaming");

    let delay = state.chunk_delay;
    let frames = stream::iter(mode.chunks().iter().map(|c| wrap_chunk(c)))
        .then(move |frame| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            frame
        })
        .chain(stream::once(async { wrapped_done() }))
        .map(Ok::<_, Infallible>);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(frames))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Build the mock upstream router.
pub fn build_mock_router(chunk_delay: Duration) -> Router {
    Router::new()
        .route("/chat/completions", post(mock_chat_completions))
        .with_state(MockState { chunk_delay })
}
