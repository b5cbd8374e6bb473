use chatdeck_core::ChatStatus;
use serde::Serialize;

/// Notifications published by the coordinator for the UI surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// New content was appended or loaded for `tab_id`.
    ScrollToLatest { tab_id: String },
    /// The displayed conversation for `tab_id` changed status.
    StatusChanged { tab_id: String, status: ChatStatus },
    /// A send from `origin_tab_id` created (or moved to) session `thread_id`.
    TabBound {
        thread_id: String,
        origin_tab_id: String,
    },
}
