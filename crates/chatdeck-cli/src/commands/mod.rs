pub mod repl;
pub mod send;
pub mod session;
pub mod settings;

use anyhow::{Result, bail};
use chatdeck_application::{ChatStateCoordinator, ChatView};
use chatdeck_core::ChatStatus;

/// Opens (or focuses) the tab for `thread_id` and waits for its history.
pub async fn open_session(
    coordinator: &ChatStateCoordinator,
    thread_id: &str,
    label: &str,
) -> Result<ChatView> {
    let tabs = coordinator.tabs();
    if !tabs.contains(thread_id) {
        tabs.register_session_tab(thread_id, label, &tabs.active_id())?;
    }
    tabs.select(thread_id)?;
    coordinator.wait_idle().await;

    let view = coordinator.view();
    if view.status == ChatStatus::Error {
        bail!(
            "Failed to load session {}: {}",
            thread_id,
            view.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(view)
}
