// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Derived event client
//
// Decodes the gateway's SSE output back into (event, payload) records and
// accumulates the final answer. Used by the `splitgate-client` binary and
// by end-to-end tests.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::{json, Value};

use crate::upstream::{split_lines, UpstreamError};

/// One decoded derived event.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    /// The `event:` name in effect when the data line arrived, if any.
    pub event: Option<String>,
    pub data: Value,
}

impl ReceivedEvent {
    pub fn is(&self, name: &str) -> bool {
        self.event.as_deref() == Some(name)
    }

    /// The `text` field of the payload, if present.
    pub fn text(&self) -> Option<&str> {
        self.data.get("text").and_then(Value::as_str)
    }
}

/// Line-oriented decoder for derived event streams.
#[derive(Debug, Default)]
pub struct SseDecoder {
    current_event: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator).
    ///
    /// Blank lines end the current event; `event:` lines set its name;
    /// `data:` lines yield a record. Data that is not JSON is wrapped as
    /// `{"raw": <text>}`.
    pub fn feed_line(&mut self, raw: &str) -> Option<ReceivedEvent> {
        let line = raw.trim();

        if line.is_empty() {
            self.current_event = None;
            return None;
        }

        if let Some(name) = line.strip_prefix("event:") {
            self.current_event = Some(name.trim().to_string());
            return None;
        }

        let data = line.strip_prefix("data:")?.trim();
        let data = serde_json::from_str(data).unwrap_or_else(|_| json!({"raw": data}));
        Some(ReceivedEvent {
            event: self.current_event.clone(),
            data,
        })
    }
}

/// Accumulates `final_output_delta` texts until `done`.
#[derive(Debug, Default)]
pub struct Transcript {
    pub events: Vec<ReceivedEvent>,
    pub final_text: String,
    pub finished: bool,
}

impl Transcript {
    pub fn record(&mut self, event: ReceivedEvent) {
        if event.is("final_output_delta") {
            if let Some(text) = event.text() {
                self.final_text.push_str(text);
            }
        }
        if event.is("done") {
            self.finished = true;
        }
        self.events.push(event);
    }

    /// Event names in arrival order.
    pub fn names(&self) -> Vec<&str> {
        self.events
            .iter()
            .map(|e| e.event.as_deref().unwrap_or(""))
            .collect()
    }

    /// Decode a complete response body.
    pub fn from_body(body: &str) -> Self {
        let mut decoder = SseDecoder::new();
        let mut transcript = Transcript::default();
        for line in body.lines() {
            if let Some(event) = decoder.feed_line(line) {
                transcript.record(event);
                if transcript.finished {
                    break;
                }
            }
        }
        transcript
    }
}

/// Read a gateway response body until `done` or end of stream.
///
/// `on_event` sees each event as it arrives. Bytes are cut into whole lines
/// before decoding, so a character split across chunks arrives intact.
pub async fn read_events<S, F>(body: S, mut on_event: F) -> Result<Transcript, UpstreamError>
where
    S: Stream<Item = Result<Bytes, UpstreamError>> + Send + Unpin + 'static,
    F: FnMut(&ReceivedEvent),
{
    let mut lines = split_lines(body);
    let mut decoder = SseDecoder::new();
    let mut transcript = Transcript::default();

    while let Some(line) = lines.next().await {
        let Some(event) = decoder.feed_line(&line?) else {
            continue;
        };
        on_event(&event);
        transcript.record(event);
        if transcript.finished {
            break;
        }
    }
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn byte_chunks(parts: Vec<Vec<u8>>) -> impl Stream<Item = Result<Bytes, UpstreamError>> + Send + Unpin {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))).collect::<Vec<_>>())
    }

    #[test]
    fn decodes_named_events() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed_line("event: reasoning_summary"), None);
        let event = decoder.feed_line("data: {\"text\":\"plan\"}").unwrap();
        assert!(event.is("reasoning_summary"));
        assert_eq!(event.text(), Some("plan"));
    }

    #[test]
    fn blank_line_resets_event_name() {
        let mut decoder = SseDecoder::new();
        decoder.feed_line("event: done");
        decoder.feed_line("");
        let event = decoder.feed_line("data: {}").unwrap();
        assert_eq!(event.event, None);
    }

    #[test]
    fn non_json_data_is_wrapped() {
        let mut decoder = SseDecoder::new();
        let event = decoder.feed_line("data: plain words").unwrap();
        assert_eq!(event.data, json!({"raw": "plain words"}));
    }

    #[test]
    fn other_fields_are_ignored() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed_line(": comment"), None);
        assert_eq!(decoder.feed_line("id: 4"), None);
    }

    #[test]
    fn transcript_accumulates_final_text_until_done() {
        let body = concat!(
            "event: prompt_summary\ndata: {\"text\":\"hi\",\"ttft_ms\":0}\n\n",
            "event: reasoning_summary\ndata: {\"text\":\"plan\"}\n\n",
            "event: final_output_delta\ndata: {\"text\":\"Hi! \"}\n\n",
            "event: final_output_delta\ndata: {\"text\":\"Bye.\"}\n\n",
            "event: done\ndata: {}\n\n",
            "event: final_output_delta\ndata: {\"text\":\"ignored\"}\n\n",
        );
        let transcript = Transcript::from_body(body);
        assert!(transcript.finished);
        assert_eq!(transcript.final_text, "Hi! Bye.");
        assert_eq!(
            transcript.names(),
            vec![
                "prompt_summary",
                "reasoning_summary",
                "final_output_delta",
                "final_output_delta",
                "done"
            ]
        );
    }

    #[tokio::test]
    async fn read_events_keeps_characters_split_across_chunks() {
        let body = "event: final_output_delta\ndata: {\"text\":\"café\"}\n\nevent: done\ndata: {}\n\n";
        let bytes = body.as_bytes();
        // Cut between the two bytes of `é`.
        let cut = body.find('é').unwrap() + 1;
        let parts = vec![bytes[..cut].to_vec(), bytes[cut..].to_vec()];

        let mut seen = Vec::new();
        let transcript = read_events(byte_chunks(parts), |e| seen.push(e.data.clone()))
            .await
            .unwrap();

        assert_eq!(transcript.final_text, "café");
        assert!(transcript.finished);
        assert_eq!(seen, vec![json!({"text": "café"}), json!({})]);
    }

    #[tokio::test]
    async fn read_events_stops_at_done() {
        let body = "event: done\ndata: {}\n\nevent: final_output_delta\ndata: {\"text\":\"late\"}\n\n";
        let transcript = read_events(byte_chunks(vec![body.as_bytes().to_vec()]), |_| {})
            .await
            .unwrap();
        assert_eq!(transcript.names(), vec!["done"]);
        assert!(transcript.final_text.is_empty());
    }

    #[tokio::test]
    async fn read_events_reports_transport_failure() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"event: final_output_delta\n")),
            Err(UpstreamError::Transport("reset".to_string())),
        ]);
        let err = read_events(body, |_| {}).await.err().unwrap();
        assert_eq!(err, UpstreamError::Transport("reset".to_string()));
    }
}
