// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Reasoning splitter
//
// Per-request state machine that separates reasoning text from final
// answer text. Markers are matched within a single delta only: a marker
// split across two deltas is never recognized, and the text around it is
// treated as final output.

use std::time::Instant;

use super::summarize::summarize;
use super::types::{BoundedBuffer, DerivedEvent, PushOutcome, SplitterConfig};

/// Maximum length of the reasoning summary, in characters.
pub const REASONING_SUMMARY_MAX_CHARS: usize = 240;

/// Summary text used when no reasoning was buffered.
pub const REASONING_NOT_DETECTED: &str = "Reasoning not detected.";

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Mutable per-request state driven by [`ReasoningSplitter`].
///
/// Owned by the single task handling the request. `finalize` consumes it.
#[derive(Debug)]
pub struct Session {
    in_reasoning: bool,
    reasoning_buffer: BoundedBuffer,
    final_buffer: BoundedBuffer,
    reasoning_summary_sent: bool,
    started_at: Instant,
}

impl Session {
    pub fn new(config: &SplitterConfig) -> Self {
        Self {
            in_reasoning: false,
            reasoning_buffer: BoundedBuffer::new(config.max_reasoning_chars),
            final_buffer: BoundedBuffer::new(config.max_buffered_final_chars),
            reasoning_summary_sent: false,
            started_at: Instant::now(),
        }
    }

    pub fn in_reasoning(&self) -> bool {
        self.in_reasoning
    }

    pub fn reasoning_summary_sent(&self) -> bool {
        self.reasoning_summary_sent
    }

    pub fn reasoning_text(&self) -> &str {
        self.reasoning_buffer.as_str()
    }

    pub fn buffered_final_text(&self) -> &str {
        self.final_buffer.as_str()
    }

    /// Milliseconds since the session was created.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Emit the reasoning summary, then any final text held back for it.
    fn release_summary(&mut self, events: &mut Vec<DerivedEvent>) {
        self.reasoning_summary_sent = true;

        let text = summarize(self.reasoning_buffer.as_str(), REASONING_SUMMARY_MAX_CHARS);
        let text = if text.is_empty() {
            REASONING_NOT_DETECTED.to_string()
        } else {
            text
        };
        events.push(DerivedEvent::ReasoningSummary { text });

        if !self.final_buffer.is_empty() {
            events.push(DerivedEvent::final_output(self.final_buffer.take()));
        }
    }
}

// ---------------------------------------------------------------------------
// ReasoningSplitter
// ---------------------------------------------------------------------------

/// Splits a stream of text deltas into reasoning and final output.
///
/// Holds only immutable configuration; all per-request state lives in
/// [`Session`], so one splitter can serve any number of requests.
#[derive(Debug, Clone)]
pub struct ReasoningSplitter {
    config: SplitterConfig,
}

impl ReasoningSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    /// Start a new session with this splitter's buffer caps.
    pub fn session(&self) -> Session {
        Session::new(&self.config)
    }

    /// Consume one delta and return the events it produces, in order.
    pub fn feed(&self, session: &mut Session, delta: &str) -> Vec<DerivedEvent> {
        let mut events = Vec::new();
        let mut text = delta.to_string();

        if text.contains(self.config.start_marker.as_str()) {
            session.in_reasoning = true;
            text = text.replacen(self.config.start_marker.as_str(), "", 1);
        }

        if text.contains(self.config.end_marker.as_str()) {
            session.in_reasoning = false;
            text = text.replacen(self.config.end_marker.as_str(), "", 1);

            if !session.reasoning_summary_sent {
                session.release_summary(&mut events);
            }
        }

        if session.in_reasoning && !session.reasoning_summary_sent {
            if session.reasoning_buffer.push(&text) == PushOutcome::FirstOverflow {
                tracing::warn!(
                    cap = session.reasoning_buffer.cap(),
                    "reasoning buffer full, dropping further reasoning text"
                );
            }
        } else if !session.reasoning_summary_sent {
            if session.final_buffer.push(&text) == PushOutcome::FirstOverflow {
                tracing::warn!(
                    cap = session.final_buffer.cap(),
                    "final output buffer full, dropping further buffered text"
                );
            }
        } else if !text.is_empty() {
            events.push(DerivedEvent::final_output(text));
        }

        events
    }

    /// Close the session after the upstream stream ended.
    ///
    /// Emits the reasoning summary (and any held-back final text) if no end
    /// marker was ever seen, then `Done`.
    pub fn finalize(&self, mut session: Session) -> Vec<DerivedEvent> {
        let mut events = Vec::new();
        if !session.reasoning_summary_sent {
            session.release_summary(&mut events);
        }
        events.push(DerivedEvent::Done {});
        events
    }
}
