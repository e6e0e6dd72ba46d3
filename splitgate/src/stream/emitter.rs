// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Event emitter
//
// Serializes derived events into SSE framing:
//
//   event: <name>\n
//   data: <json payload>\n
//   \n

use bytes::Bytes;

use super::types::DerivedEvent;

/// Content type of the derived event stream.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Encode one derived event as an SSE frame.
pub fn encode_event(event: &DerivedEvent) -> Bytes {
    // Every variant is a map of strings and integers; serialization cannot fail.
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Bytes::from(format!("event: {}\ndata: {}\n\n", event.name(), data))
}
