//! Helpers for assistant turns that start with a `<think>…</think>` section.
//!
//! The message editor treats content as opaque. Callers that let users edit
//! only the visible part of such a turn split it first and splice the
//! reasoning back before calling the editor.

use once_cell::sync::Lazy;
use regex::Regex;

static REASONING_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*<think>(.*?)</think>\s*(.*)$").expect("reasoning pattern is valid")
});

/// Splits `content` into its reasoning section (if any) and the visible reply.
pub fn split_reasoning(content: &str) -> (Option<&str>, &str) {
    match REASONING_PREFIX.captures(content) {
        Some(caps) => {
            let reasoning = caps.get(1).map(|m| m.as_str());
            let visible = caps.get(2).map_or("", |m| m.as_str());
            (reasoning, visible)
        }
        None => (None, content),
    }
}

/// Rebuilds full content from `original`'s reasoning section and a new
/// visible part. Content without a reasoning section is replaced outright.
pub fn splice_reasoning(original: &str, new_visible: &str) -> String {
    match split_reasoning(original) {
        (Some(reasoning), _) => format!("<think>{reasoning}</think>\n\n{new_visible}"),
        (None, _) => new_visible.to_string(),
    }
}
