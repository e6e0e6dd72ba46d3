// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

// Gateway configuration
//
// Built once at startup from a `ConfigSource` and shared immutably with
// every request. The stream core receives the values it needs through
// `SplitterConfig`; nothing below this module reads the environment.

mod defaults;
mod error;
mod source;

pub use defaults::*;
pub use error::ConfigError;
pub use source::{ConfigSource, EnvSource, MapSource};

use crate::stream::SplitterConfig;

/// Immutable gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL of the upstream completion service, without trailing `/`.
    pub upstream_base_url: String,
    pub reasoning_start: String,
    pub reasoning_end: String,
    pub max_reasoning_chars: usize,
    pub max_buffered_final_chars: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            reasoning_start: DEFAULT_REASONING_START.to_string(),
            reasoning_end: DEFAULT_REASONING_END.to_string(),
            max_reasoning_chars: DEFAULT_MAX_REASONING_CHARS,
            max_buffered_final_chars: DEFAULT_MAX_BUFFERED_FINAL_CHARS,
        }
    }
}

impl GatewayConfig {
    /// Full URL of the upstream chat completions endpoint.
    pub fn upstream_url(&self) -> String {
        format!("{}/chat/completions", self.upstream_base_url)
    }

    /// The subset of configuration the reasoning splitter needs.
    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig {
            start_marker: self.reasoning_start.clone(),
            end_marker: self.reasoning_end.clone(),
            max_reasoning_chars: self.max_reasoning_chars,
            max_buffered_final_chars: self.max_buffered_final_chars,
        }
    }
}

/// Load and validate the gateway configuration.
///
/// Every key is optional; absent keys take the defaults in `defaults.rs`.
pub fn load_config(source: &dyn ConfigSource) -> Result<GatewayConfig, ConfigError> {
    let upstream_base_url = source
        .var(UPSTREAM_BASE_URL_KEY)
        .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    if !upstream_base_url.starts_with("http://") && !upstream_base_url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{UPSTREAM_BASE_URL_KEY} must be an http(s) URL, got \"{upstream_base_url}\""
        )));
    }

    let reasoning_start = source
        .var(REASONING_START_KEY)
        .unwrap_or_else(|| DEFAULT_REASONING_START.to_string());
    let reasoning_end = source
        .var(REASONING_END_KEY)
        .unwrap_or_else(|| DEFAULT_REASONING_END.to_string());
    for (key, marker) in [
        (REASONING_START_KEY, &reasoning_start),
        (REASONING_END_KEY, &reasoning_end),
    ] {
        if marker.is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    let max_reasoning_chars = parse_usize(
        source,
        MAX_REASONING_CHARS_KEY,
        DEFAULT_MAX_REASONING_CHARS,
    )?;
    let max_buffered_final_chars = parse_usize(
        source,
        MAX_BUFFERED_FINAL_CHARS_KEY,
        DEFAULT_MAX_BUFFERED_FINAL_CHARS,
    )?;

    Ok(GatewayConfig {
        upstream_base_url,
        reasoning_start,
        reasoning_end,
        max_reasoning_chars,
        max_buffered_final_chars,
    })
}

fn parse_usize(
    source: &dyn ConfigSource,
    key: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    match source.var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            key,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let config = load_config(&MapSource::new()).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.upstream_url(), "http://127.0.0.1:8001/chat/completions");
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let source = MapSource::new().with(UPSTREAM_BASE_URL_KEY, "http://upstream.local:9001//");
        let config = load_config(&source).unwrap();
        assert_eq!(config.upstream_base_url, "http://upstream.local:9001");
        assert_eq!(config.upstream_url(), "http://upstream.local:9001/chat/completions");
    }

    #[test]
    fn custom_markers_and_caps_are_applied() {
        let source = MapSource::new()
            .with(REASONING_START_KEY, "[[r]]")
            .with(REASONING_END_KEY, "[[/r]]")
            .with(MAX_REASONING_CHARS_KEY, "128")
            .with(MAX_BUFFERED_FINAL_CHARS_KEY, " 64 ");
        let config = load_config(&source).unwrap();

        let splitter = config.splitter_config();
        assert_eq!(splitter.start_marker, "[[r]]");
        assert_eq!(splitter.end_marker, "[[/r]]");
        assert_eq!(splitter.max_reasoning_chars, 128);
        assert_eq!(splitter.max_buffered_final_chars, 64);
    }

    #[test]
    fn non_numeric_cap_is_rejected() {
        let source = MapSource::new().with(MAX_REASONING_CHARS_KEY, "lots");
        let err = load_config(&source).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: MAX_REASONING_CHARS_KEY,
                value: "lots".to_string(),
            }
        );
        assert!(err.to_string().contains("MAX_REASONING_CHARS"));
    }

    #[test]
    fn negative_cap_is_rejected() {
        let source = MapSource::new().with(MAX_BUFFERED_FINAL_CHARS_KEY, "-1");
        assert!(matches!(
            load_config(&source),
            Err(ConfigError::InvalidNumber { key: MAX_BUFFERED_FINAL_CHARS_KEY, .. })
        ));
    }

    #[test]
    fn empty_marker_is_rejected() {
        let source = MapSource::new().with(REASONING_END_KEY, "");
        let err = load_config(&source).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("REASONING_END"));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let source = MapSource::new().with(UPSTREAM_BASE_URL_KEY, "ftp://nope");
        assert!(matches!(load_config(&source), Err(ConfigError::Validation(_))));
    }
}
