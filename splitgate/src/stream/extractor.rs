// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Chunk extractor
//
// Turns one line of the upstream's SSE framing into an optional text
// delta. The upstream wraps its OpenAI-style `data:` lines inside the
// `data:` field of another SSE event, so prefixes are stripped until
// none remain.

/// SSE field prefix carrying an event payload.
pub const DATA_PREFIX: &str = "data:";

/// Payload that terminates an OpenAI-style stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Extract the text delta carried by one upstream line.
///
/// Returns `None` for anything that is not a content-bearing `data:` line:
/// other SSE fields, the `[DONE]` sentinel, unparsable JSON, or a payload
/// without a string at `choices[0].delta.content`.
pub fn extract_delta(line: &str) -> Option<String> {
    if !line.starts_with(DATA_PREFIX) {
        return None;
    }

    let payload = strip_data_prefixes(line);
    if payload == DONE_SENTINEL {
        return None;
    }

    let json: serde_json::Value = serde_json::from_str(payload).ok()?;
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
}

/// Strip every leading `data:` prefix, along with the whitespace after it.
fn strip_data_prefixes(line: &str) -> &str {
    let mut payload = line;
    while let Some(rest) = payload.strip_prefix(DATA_PREFIX) {
        payload = rest.trim_start();
    }
    payload
}
