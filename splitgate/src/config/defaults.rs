// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

pub const UPSTREAM_BASE_URL_KEY: &str = "UPSTREAM_BASE_URL";
pub const REASONING_START_KEY: &str = "REASONING_START";
pub const REASONING_END_KEY: &str = "REASONING_END";
pub const MAX_REASONING_CHARS_KEY: &str = "MAX_REASONING_CHARS";
pub const MAX_BUFFERED_FINAL_CHARS_KEY: &str = "MAX_BUFFERED_FINAL_CHARS";

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_REASONING_START: &str = "<think>";
pub const DEFAULT_REASONING_END: &str = "</think>";
pub const DEFAULT_MAX_REASONING_CHARS: usize = 20_000;
pub const DEFAULT_MAX_BUFFERED_FINAL_CHARS: usize = 20_000;
