// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Session driver
//
// One task per client request:
//   prompt_summary -> open upstream -> per line: extract, feed -> finalize
//
// Events go out through a bounded channel whose receiver backs the HTTP
// response body. The task reads the next upstream line only after the
// previous event was accepted, and stops (dropping the upstream call) as
// soon as the receiver goes away.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;
use uuid::Uuid;

use crate::message::ChatRequest;
use crate::stream::{extract_delta, summarize, DerivedEvent, ReasoningSplitter, Session};
use crate::upstream::UpstreamClient;

/// Maximum length of the prompt summary, in characters.
pub const PROMPT_SUMMARY_MAX_CHARS: usize = 200;

/// Summary text used when the request has no user message.
pub const NO_USER_MESSAGE: &str = "No user message found.";

/// Capacity 1: at most one derived event waits for the client.
const EVENT_CHANNEL_CAPACITY: usize = 1;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Upstream finished and `finalize` ran.
    Completed { final_deltas: usize },
    /// Upstream failed; `error` and `done` were sent.
    UpstreamFailed,
    /// The client went away before `done`.
    ClientDisconnected,
}

/// The client stopped receiving events.
struct ClientGone;

/// Sends derived events to the client and counts final output deltas.
struct EventSink<'a> {
    tx: &'a mpsc::Sender<DerivedEvent>,
    final_deltas: usize,
}

impl EventSink<'_> {
    async fn send(&mut self, event: DerivedEvent) -> Result<(), ClientGone> {
        if matches!(event, DerivedEvent::FinalOutputDelta { .. }) {
            self.final_deltas += 1;
        }
        self.tx.send(event).await.map_err(|_| ClientGone)
    }

    async fn send_all(&mut self, events: Vec<DerivedEvent>) -> Result<(), ClientGone> {
        for event in events {
            self.send(event).await?;
        }
        Ok(())
    }
}

/// Build the prompt summary event for `request`.
pub fn prompt_summary(request: &ChatRequest, session: &Session) -> DerivedEvent {
    let text = summarize(
        &request.last_user_message().unwrap_or_default(),
        PROMPT_SUMMARY_MAX_CHARS,
    );
    let text = if text.is_empty() {
        NO_USER_MESSAGE.to_string()
    } else {
        text
    };
    DerivedEvent::PromptSummary {
        text,
        ttft_ms: session.elapsed_ms(),
    }
}

/// Drive one session to completion, sending every derived event to `tx`.
///
/// `done` is always the last event sent, unless the client disconnected
/// first.
pub async fn run_session(
    splitter: &ReasoningSplitter,
    upstream: &dyn UpstreamClient,
    request: &ChatRequest,
    tx: mpsc::Sender<DerivedEvent>,
) -> SessionOutcome {
    let mut sink = EventSink {
        tx: &tx,
        final_deltas: 0,
    };
    match drive(splitter, upstream, request, &mut sink).await {
        Ok(outcome) => outcome,
        Err(ClientGone) => SessionOutcome::ClientDisconnected,
    }
}

async fn drive(
    splitter: &ReasoningSplitter,
    upstream: &dyn UpstreamClient,
    request: &ChatRequest,
    sink: &mut EventSink<'_>,
) -> Result<SessionOutcome, ClientGone> {
    let mut session = splitter.session();
    sink.send(prompt_summary(request, &session)).await?;

    let opened = tokio::select! {
        biased;
        _ = sink.tx.closed() => return Err(ClientGone),
        opened = upstream.open(request) => opened,
    };
    let mut lines = match opened {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!(error = %e, "upstream call failed");
            sink.send(DerivedEvent::error(e.to_string())).await?;
            sink.send(DerivedEvent::Done {}).await?;
            return Ok(SessionOutcome::UpstreamFailed);
        }
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = sink.tx.closed() => return Err(ClientGone),
            next = lines.next() => next,
        };

        match next {
            Some(Ok(line)) => match extract_delta(&line) {
                Some(delta) => {
                    let events = splitter.feed(&mut session, &delta);
                    sink.send_all(events).await?;
                }
                None => {
                    if !line.is_empty() {
                        tracing::debug!(line = %line, "skipping non-content upstream line");
                    }
                }
            },
            Some(Err(e)) => {
                tracing::warn!(error = %e, "upstream stream failed");
                sink.send(DerivedEvent::error(e.to_string())).await?;
                sink.send(DerivedEvent::Done {}).await?;
                return Ok(SessionOutcome::UpstreamFailed);
            }
            None => break,
        }
    }

    sink.send_all(splitter.finalize(session)).await?;
    Ok(SessionOutcome::Completed {
        final_deltas: sink.final_deltas,
    })
}

/// Spawn a session task and return the stream of its derived events.
pub fn spawn_session(
    splitter: Arc<ReasoningSplitter>,
    upstream: Arc<dyn UpstreamClient>,
    request: ChatRequest,
) -> ReceiverStream<DerivedEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let span = tracing::info_span!(
        "session",
        request_id = %Uuid::new_v4(),
        model = request.model.as_deref().unwrap_or(""),
        mode = request.mode.as_deref().unwrap_or(""),
    );

    tokio::spawn(
        async move {
            let started = Instant::now();
            tracing::info!(messages = request.messages.len(), "session started");

            let outcome = run_session(&splitter, upstream.as_ref(), &request, tx).await;

            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            match outcome {
                SessionOutcome::Completed { final_deltas } => {
                    tracing::info!(final_deltas, elapsed_ms, "session completed");
                }
                SessionOutcome::UpstreamFailed => {
                    tracing::info!(elapsed_ms, "session ended after upstream failure");
                }
                SessionOutcome::ClientDisconnected => {
                    tracing::info!(elapsed_ms, "client disconnected, upstream call dropped");
                }
            }
        }
        .instrument(span),
    );

    ReceiverStream::new(rx)
}
