// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

/// All errors that can occur while building the gateway configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got \"{value}\"")]
    InvalidNumber { key: &'static str, value: String },

    #[error("validation error: {0}")]
    Validation(String),
}
