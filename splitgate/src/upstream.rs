// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Upstream completion service
//
// Responsibilities:
// - Open a streaming chat completions call via an injected client
// - Reject non-200 responses before any line is read
// - Expose the response body as a stream of text lines
//
// The session driver depends only on `UpstreamClient`, so tests can feed
// scripted lines without a server.

use std::pin::Pin;

use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};

use crate::message::ChatRequest;

/// Lines of an upstream response body, without their line terminators.
pub type UpstreamLines = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// Errors from the upstream call. `Display` is the message sent to the
/// client in the `error` event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream error {}", .0.as_u16())]
    Status(StatusCode),

    #[error("Upstream connection error: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// Trait: UpstreamClient (dependency injection point)
// ---------------------------------------------------------------------------

/// Opens streaming calls to the upstream completion service.
#[async_trait::async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Start a streaming call for `request`.
    ///
    /// Returns the body as lines once the upstream has answered with 200.
    async fn open(&self, request: &ChatRequest) -> Result<UpstreamLines, UpstreamError>;
}

// ---------------------------------------------------------------------------
// Reqwest implementation
// ---------------------------------------------------------------------------

/// Upstream client backed by `reqwest`, posting to `<base>/chat/completions`.
///
/// No request timeout is set: streamed responses may run indefinitely.
pub struct ReqwestUpstreamClient {
    client: reqwest::Client,
    url: String,
}

impl ReqwestUpstreamClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn open(&self, request: &ChatRequest) -> Result<UpstreamLines, UpstreamError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&request.upstream_body())
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(UpstreamError::Status(status));
        }

        let body = resp
            .bytes_stream()
            .map_err(|e| UpstreamError::Transport(e.to_string()));
        Ok(split_lines(Box::pin(body)))
    }
}

// ---------------------------------------------------------------------------
// Line splitting
// ---------------------------------------------------------------------------

struct LineState<S> {
    input: S,
    pending: Vec<u8>,
    exhausted: bool,
}

/// Split a byte stream into lines.
///
/// Lines end at `\n`, `\r\n` or a bare `\r`. A final line without a
/// terminator is still yielded. Bytes are buffered until a full line is
/// available, so multi-byte characters split across chunks decode intact.
/// After a transport error the stream yields that error and ends.
pub fn split_lines<S>(input: S) -> UpstreamLines
where
    S: Stream<Item = Result<Bytes, UpstreamError>> + Send + Unpin + 'static,
{
    let state = LineState {
        input,
        pending: Vec::new(),
        exhausted: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.pending.iter().position(|b| *b == b'\n' || *b == b'\r') {
                let is_cr = state.pending[pos] == b'\r';
                // A `\r` at the end of the buffer may be the first half of `\r\n`.
                let await_lf = is_cr && pos + 1 == state.pending.len() && !state.exhausted;
                if !await_lf {
                    let end = if is_cr && state.pending.get(pos + 1) == Some(&b'\n') {
                        pos + 2
                    } else {
                        pos + 1
                    };
                    let mut line: Vec<u8> = state.pending.drain(..end).collect();
                    line.truncate(pos);
                    return Some((Ok(decode_line(line)), state));
                }
            }

            if state.exhausted {
                if state.pending.is_empty() {
                    return None;
                }
                let line = std::mem::take(&mut state.pending);
                return Some((Ok(decode_line(line)), state));
            }

            match state.input.next().await {
                Some(Ok(chunk)) => state.pending.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    state.exhausted = true;
                    state.pending.clear();
                    return Some((Err(e), state));
                }
                None => state.exhausted = true,
            }
        }
    }))
}

fn decode_line(line: Vec<u8>) -> String {
    match String::from_utf8(line) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ChatMessage;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = Result<Bytes, UpstreamError>> + Send + Unpin {
        let parts: Vec<Result<Bytes, UpstreamError>> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p)))
            .collect();
        stream::iter(parts)
    }

    async fn collect(lines: UpstreamLines) -> Vec<Result<String, UpstreamError>> {
        lines.collect().await
    }

    fn request() -> ChatRequest {
        let mut req = ChatRequest::new(vec![ChatMessage::new("user", "hi")]);
        req.model = Some("x".to_string());
        req.mode = Some("normal".to_string());
        req
    }

    #[tokio::test]
    async fn splits_lines_across_chunk_boundaries() {
        let lines = split_lines(chunks(&[
            "event: mes".as_bytes(),
            "sage\ndata: a\n".as_bytes(),
            "\ndata: b".as_bytes(),
        ]));
        let out: Vec<String> = collect(lines).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["event: message", "data: a", "", "data: b"]);
    }

    #[tokio::test]
    async fn strips_carriage_returns() {
        let lines = split_lines(chunks(&["data: a\r\n\r\n".as_bytes()]));
        let out: Vec<String> = collect(lines).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["data: a", ""]);
    }

    #[tokio::test]
    async fn bare_carriage_return_ends_a_line() {
        let lines = split_lines(chunks(&["data: a\rdata: b\r".as_bytes()]));
        let out: Vec<String> = collect(lines).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["data: a", "data: b"]);
    }

    #[tokio::test]
    async fn crlf_split_across_chunks_is_one_terminator() {
        let lines = split_lines(chunks(&[
            "data: a\r".as_bytes(),
            "\ndata: b\r\n".as_bytes(),
        ]));
        let out: Vec<String> = collect(lines).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["data: a", "data: b"]);
    }

    #[tokio::test]
    async fn multibyte_characters_survive_chunk_splits() {
        let bytes = "data: é\n".as_bytes();
        let (head, tail) = bytes.split_at(7);
        let lines = split_lines(chunks(&[head, tail]));
        let out: Vec<String> = collect(lines).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["data: é"]);
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream() {
        let input = stream::iter(vec![
            Ok(Bytes::from_static(b"data: a\ndata: partial")),
            Err(UpstreamError::Transport("reset".to_string())),
            Ok(Bytes::from_static(b"data: never\n")),
        ]);
        let out = collect(split_lines(input)).await;
        assert_eq!(
            out,
            vec![
                Ok("data: a".to_string()),
                Err(UpstreamError::Transport("reset".to_string())),
            ]
        );
    }

    #[test]
    fn error_messages_match_client_protocol() {
        assert_eq!(
            UpstreamError::Status(StatusCode::INTERNAL_SERVER_ERROR).to_string(),
            "Upstream error 500"
        );
        assert_eq!(
            UpstreamError::Transport("connection refused".to_string()).to_string(),
            "Upstream connection error: connection refused"
        );
    }

    #[tokio::test]
    async fn reqwest_client_streams_lines_and_forces_stream_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"stream": true, "mode": "normal"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("event: message\ndata: data: [DONE]\n\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ReqwestUpstreamClient::new(
            reqwest::Client::new(),
            format!("{}/chat/completions", server.uri()),
        );
        let mut req = request();
        req.stream = false;

        let lines = client.open(&req).await.expect("upstream should answer 200");
        let out: Vec<String> = collect(lines).await.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["event: message", "data: data: [DONE]", ""]);
    }

    #[tokio::test]
    async fn reqwest_client_reports_non_200_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ReqwestUpstreamClient::new(
            reqwest::Client::new(),
            format!("{}/chat/completions", server.uri()),
        );
        let err = client.open(&request()).await.err().unwrap();
        assert_eq!(err, UpstreamError::Status(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn reqwest_client_reports_connection_failure() {
        // Bind then drop a listener to get a port nobody is serving.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ReqwestUpstreamClient::new(
            reqwest::Client::new(),
            format!("http://{addr}/chat/completions"),
        );
        let err = client.open(&request()).await.err().unwrap();
        assert!(matches!(err, UpstreamError::Transport(_)), "got {err:?}");
        assert!(err.to_string().starts_with("Upstream connection error: "));
    }
}
