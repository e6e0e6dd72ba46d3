// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Reasoning-aware stream core
//
// Responsibilities:
// - Extract text deltas from double-wrapped upstream SSE lines
// - Track reasoning regions delimited by start/end markers
// - Buffer reasoning and pre-boundary final text under character caps
// - Emit prompt/reasoning summaries, final output deltas, error and done
// - Encode derived events as SSE frames
//
// Nothing here touches the network; the session driver in `session.rs`
// feeds upstream lines in and forwards encoded events out.

mod emitter;
mod extractor;
mod splitter;
mod summarize;
mod types;

pub use emitter::{encode_event, EVENT_STREAM_CONTENT_TYPE};
pub use extractor::{extract_delta, DATA_PREFIX, DONE_SENTINEL};
pub use splitter::{
    ReasoningSplitter, Session, REASONING_NOT_DETECTED, REASONING_SUMMARY_MAX_CHARS,
};
pub use summarize::summarize;
pub use types::{BoundedBuffer, DerivedEvent, PushOutcome, SplitterConfig};
