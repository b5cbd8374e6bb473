//! Open tab model.

use serde::{Deserialize, Serialize};

/// Id of the permanent "New Chat" tab.
pub const SENTINEL_NEW_CHAT: &str = "new";

/// Label of the permanent "New Chat" tab.
pub const NEW_CHAT_LABEL: &str = "New Chat";

/// Tab labels derived from a draft keep at most this many characters.
const LABEL_MAX_CHARS: usize = 30;

/// Represents an open tab.
///
/// Exactly one tab is the sentinel (`id == SENTINEL_NEW_CHAT`, not closable).
/// Every other tab is bound to a remote session and uses the thread id as its
/// own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub label: String,
    pub closable: bool,
}

impl Tab {
    /// The permanent New Chat tab.
    pub fn new_chat() -> Self {
        Self {
            id: SENTINEL_NEW_CHAT.to_string(),
            label: NEW_CHAT_LABEL.to_string(),
            closable: false,
        }
    }

    /// A tab bound to the session `thread_id`.
    pub fn session(thread_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: thread_id.into(),
            label: label.into(),
            closable: true,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        is_sentinel(&self.id)
    }
}

/// Whether `tab_id` names the New Chat tab.
pub fn is_sentinel(tab_id: &str) -> bool {
    tab_id == SENTINEL_NEW_CHAT
}

/// Label for a tab created by sending `draft`: the first 30 characters,
/// followed by `...` when truncated.
pub fn label_from_draft(draft: &str) -> String {
    let mut chars = draft.chars();
    let head: String = chars.by_ref().take(LABEL_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chat_tab_is_not_closable() {
        let tab = Tab::new_chat();
        assert!(tab.is_sentinel());
        assert!(!tab.closable);
        assert_eq!(tab.label, NEW_CHAT_LABEL);
    }

    #[test]
    fn test_session_tab_is_closable() {
        let tab = Tab::session("t1", "hello");
        assert!(!tab.is_sentinel());
        assert!(tab.closable);
    }

    #[test]
    fn test_label_from_short_draft_is_unchanged() {
        assert_eq!(label_from_draft("hello"), "hello");
        assert_eq!(label_from_draft(&"a".repeat(30)), "a".repeat(30));
    }

    #[test]
    fn test_label_from_long_draft_is_truncated() {
        let draft = "Explain the borrow checker to me like I am five years old";
        let label = label_from_draft(draft);
        assert_eq!(label, "Explain the borrow checker to ...");
    }

    #[test]
    fn test_label_truncation_respects_char_boundaries() {
        let draft = "é".repeat(40);
        assert_eq!(label_from_draft(&draft), format!("{}...", "é".repeat(30)));
    }
}
