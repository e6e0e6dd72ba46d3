// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Client request model
//
// The gateway only reads `messages` (for the prompt summary), `stream`
// (validation) and `mode`/`model` (logging). Every other field is kept
// in `extra` and forwarded upstream untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One chat message as sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Empty when the client omitted it; such messages never count as `user`.
    #[serde(default)]
    pub role: String,
    /// Either a plain string or an array of content parts.
    #[serde(default)]
    pub content: Value,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Value::String(content.into()),
        }
    }

    /// Text content of the message.
    ///
    /// String content is returned as-is; for an array of parts the `text`
    /// of every part is concatenated with spaces. Anything else is empty.
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" "),
            _ => String::new(),
        }
    }
}

/// A chat completions request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Scripted scenario selector understood by the mock upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: None,
            mode: None,
            messages,
            stream: true,
            extra: Map::new(),
        }
    }

    /// Text of the last message with role `user`, if any.
    pub fn last_user_message(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(ChatMessage::text)
    }

    /// The body forwarded upstream: this request with `stream` forced on.
    pub fn upstream_body(&self) -> ChatRequest {
        ChatRequest {
            stream: true,
            ..self.clone()
        }
    }
}
