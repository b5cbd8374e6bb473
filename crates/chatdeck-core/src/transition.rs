//! Transition record cached between session creation and the next load.

use crate::message::Message;
use crate::settings::SessionSettings;
use serde::{Deserialize, Serialize};

/// The most recently known `{history, settings}` pair for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub thread_id: String,
    pub history: Vec<Message>,
    pub settings: Option<SessionSettings>,
}

impl TransitionRecord {
    pub fn new(
        thread_id: impl Into<String>,
        history: Vec<Message>,
        settings: Option<SessionSettings>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            history,
            settings,
        }
    }
}
