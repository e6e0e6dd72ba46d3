// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

/// Abstraction over where configuration values come from.
///
/// `EnvSource` reads the process environment; `MapSource` holds values
/// directly (used in tests to avoid touching global state).
pub trait ConfigSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads configuration from environment variables.
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Provides configuration values from an in-memory map.
#[derive(Debug, Default, Clone)]
pub struct MapSource {
    pub values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapSource {
    fn var(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
