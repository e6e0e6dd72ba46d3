// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Stream types
//
// Derived events produced by the reasoning splitter, the splitter's
// configuration, and the bounded text buffer used for reasoning and
// pre-boundary final text.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Derived events
// ---------------------------------------------------------------------------

/// An event synthesized by the gateway and delivered to the client.
///
/// Serialized untagged: the variant name travels in the SSE `event:` line
/// (see [`DerivedEvent::name`]) and only the fields go into `data:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DerivedEvent {
    /// Summary of the client's last user message. Always the first event.
    PromptSummary { text: String, ttft_ms: u64 },
    /// Summary of the reasoning region. At most once per session.
    ReasoningSummary { text: String },
    /// A piece of user-facing answer text.
    FinalOutputDelta { text: String },
    /// Upstream failure, always followed by `Done`.
    Error { message: String },
    /// Terminal event. Serializes as `{}`.
    Done {},
}

impl DerivedEvent {
    /// The SSE event name for this variant.
    pub fn name(&self) -> &'static str {
        match self {
            DerivedEvent::PromptSummary { .. } => "prompt_summary",
            DerivedEvent::ReasoningSummary { .. } => "reasoning_summary",
            DerivedEvent::FinalOutputDelta { .. } => "final_output_delta",
            DerivedEvent::Error { .. } => "error",
            DerivedEvent::Done {} => "done",
        }
    }

    pub fn final_output(text: impl Into<String>) -> Self {
        DerivedEvent::FinalOutputDelta { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        DerivedEvent::Error {
            message: message.into(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, DerivedEvent::Done {})
    }
}

// ---------------------------------------------------------------------------
// Splitter configuration
// ---------------------------------------------------------------------------

/// Marker literals and buffer caps for one reasoning splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    pub start_marker: String,
    pub end_marker: String,
    /// Cap on buffered reasoning text, in characters.
    pub max_reasoning_chars: usize,
    /// Cap on final text buffered before the reasoning summary, in characters.
    pub max_buffered_final_chars: usize,
}

// ---------------------------------------------------------------------------
// Bounded buffer
// ---------------------------------------------------------------------------

/// Append-only text buffer capped at a number of characters.
///
/// Appends past the cap are dropped silently; content already buffered is
/// never truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedBuffer {
    text: String,
    chars: usize,
    cap: usize,
    overflowed: bool,
}

/// Outcome of a single [`BoundedBuffer::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Everything fit.
    Stored,
    /// Some or all of the input was dropped, and this is the first time the
    /// buffer hit its cap.
    FirstOverflow,
    /// Input dropped; the buffer was already full.
    Dropped,
}

impl BoundedBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            text: String::new(),
            chars: 0,
            cap,
            overflowed: false,
        }
    }

    pub fn push(&mut self, fragment: &str) -> PushOutcome {
        if fragment.is_empty() {
            return PushOutcome::Stored;
        }
        if self.overflowed {
            return PushOutcome::Dropped;
        }

        let room = self.cap - self.chars;
        let fragment_chars = fragment.chars().count();
        if fragment_chars <= room {
            self.text.push_str(fragment);
            self.chars += fragment_chars;
            return PushOutcome::Stored;
        }

        let cut = fragment
            .char_indices()
            .nth(room)
            .map_or(fragment.len(), |(idx, _)| idx);
        self.text.push_str(&fragment[..cut]);
        self.chars = self.cap;
        self.overflowed = true;
        PushOutcome::FirstOverflow
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.chars
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Take the buffered text, leaving the buffer empty.
    ///
    /// A buffer that hit its cap stays closed for the rest of the session.
    pub fn take(&mut self) -> String {
        self.chars = 0;
        std::mem::take(&mut self.text)
    }
}
