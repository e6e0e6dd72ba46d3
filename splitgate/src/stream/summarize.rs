// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

const ELLIPSIS: &str = "...";

/// Collapse whitespace and cap `text` at `max_len` characters.
///
/// Runs of whitespace (newlines included) become single spaces and the ends
/// are trimmed. Text longer than `max_len` keeps its first `max_len - 3`
/// characters followed by `...`. An empty result is returned as-is; callers
/// pick their own fallback.
pub fn summarize(text: &str, max_len: usize) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.chars().count() <= max_len {
        return normalized;
    }

    if max_len < ELLIPSIS.len() {
        return normalized.chars().take(max_len).collect();
    }

    let mut summary: String = normalized.chars().take(max_len - ELLIPSIS.len()).collect();
    summary.push_str(ELLIPSIS);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        let out = summarize("  hello   world \n\n this   is   fine ", 200);
        assert_eq!(out, "hello world this is fine");
    }

    #[test]
    fn caps_length_with_ellipsis() {
        let text = "word ".repeat(200);
        let out = summarize(&text, 40);
        assert!(out.chars().count() <= 40);
        assert!(out.ends_with("..."));
        assert_eq!(out, format!("{}...", &text.trim()[..37]));
    }

    #[test]
    fn short_text_is_not_truncated() {
        assert_eq!(summarize("hello world", 11), "hello world");
        assert_eq!(summarize("hello world", 240), "hello world");
    }

    #[test]
    fn empty_and_blank_text_yield_empty() {
        assert_eq!(summarize("", 10), "");
        assert_eq!(summarize(" \n\t ", 10), "");
    }

    #[test]
    fn length_bound_holds_for_every_limit() {
        let text = "The quick brown fox\njumps over   the lazy dog";
        let normalized = "The quick brown fox jumps over the lazy dog";
        for n in 0..60 {
            let out = summarize(text, n);
            assert!(out.chars().count() <= n, "limit {n} produced {out:?}");
            if n >= normalized.len() {
                assert_eq!(out, normalized);
            }
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let out = summarize("ééééééééé", 5);
        assert_eq!(out, "éé...");
    }

    #[test]
    fn tiny_limits_skip_ellipsis() {
        assert_eq!(summarize("abcdef", 2), "ab");
        assert_eq!(summarize("abcdef", 3), "...");
    }
}
