use chatdeck_core::tab::is_sentinel;
use chatdeck_core::{ChatStatus, Message, SessionSettings};
use serde::Serialize;

/// Conversation state displayed for the active tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    /// Tab this view belongs to.
    pub tab_id: String,
    /// Bound session, `None` for New Chat until a send binds one.
    pub thread_id: Option<String>,
    pub history: Vec<Message>,
    /// Per-session settings; `None` means the new-chat defaults apply.
    pub session_settings: Option<SessionSettings>,
    pub status: ChatStatus,
    /// Inline error text for the last failed operation.
    pub error: Option<String>,
}

impl ChatView {
    /// Empty view for `tab_id` in the given status.
    pub fn empty(tab_id: &str, status: ChatStatus) -> Self {
        Self {
            tab_id: tab_id.to_string(),
            thread_id: (!is_sentinel(tab_id)).then(|| tab_id.to_string()),
            history: Vec::new(),
            session_settings: None,
            status,
            error: None,
        }
    }

    /// Index of the pending assistant placeholder, if any.
    pub fn placeholder_index(&self) -> Option<usize> {
        self.history.iter().position(|msg| msg.pending)
    }

    /// Turns shown, excluding a pending placeholder.
    pub fn settled_turns(&self) -> usize {
        self.history.iter().filter(|msg| !msg.pending).count()
    }
}
