// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// HTTP surface
//
// Responsibilities:
// - POST /chat/completions: validate, then stream derived events as SSE
// - GET /health: report upstream URL and reasoning markers
// - Reject empty, malformed or non-streaming requests with 400

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde_json::json;

use crate::config::GatewayConfig;
use crate::message::ChatRequest;
use crate::session::spawn_session;
use crate::stream::{encode_event, ReasoningSplitter, EVENT_STREAM_CONTENT_TYPE};
use crate::upstream::UpstreamClient;

/// Default listen host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a request is rejected before any session starts.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("request body is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("only stream=true is supported")]
    NotStreaming,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::info!(error = %self, "rejecting request");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": self.to_string()})),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state injected into axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub splitter: Arc<ReasoningSplitter>,
    pub upstream: Arc<dyn UpstreamClient>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "upstream": state.config.upstream_base_url,
        "reasoning_markers": [state.config.reasoning_start, state.config.reasoning_end],
    }))
}

/// POST /chat/completions
///
/// Validates the body, then answers with a `text/event-stream` of derived
/// events produced by a dedicated session task.
pub async fn chat_completions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let request = parse_request(&body)?;

    let events = spawn_session(state.splitter.clone(), state.upstream.clone(), request)
        .map(|event| Ok::<_, Infallible>(encode_event(&event)));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(events))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}

/// Parse and validate a chat completions body.
pub fn parse_request(body: &[u8]) -> Result<ChatRequest, GatewayError> {
    if body.is_empty() {
        return Err(GatewayError::EmptyBody);
    }
    let request: ChatRequest =
        serde_json::from_slice(body).map_err(|e| GatewayError::MalformedJson(e.to_string()))?;
    if !request.stream {
        return Err(GatewayError::NotStreaming);
    }
    Ok(request)
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// Build the gateway router.
///
/// The upstream client is injected; the splitter is built from `config`.
pub fn build_router(config: Arc<GatewayConfig>, upstream: Arc<dyn UpstreamClient>) -> Router {
    let splitter = Arc::new(ReasoningSplitter::new(config.splitter_config()));
    let state = AppState {
        config,
        splitter,
        upstream,
    };

    Router::new()
        .route("/health", get(health))
        .route("/chat/completions", post(chat_completions))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
