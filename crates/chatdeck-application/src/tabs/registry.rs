use crate::sync::lock;
use chatdeck_core::error::{ChatError, Result};
use chatdeck_core::requester::{ClearRequester, SessionLoadRequester};
use chatdeck_core::tab::{SENTINEL_NEW_CHAT, Tab, is_sentinel};
use std::collections::HashSet;
use std::sync::{Mutex, Weak};

/// What the displayed conversation must do after the active tab changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabDirective {
    /// The New Chat tab became active.
    ClearToDefaults,
    /// A session tab became active.
    LoadSession(String),
}

impl TabDirective {
    fn for_tab(tab_id: &str) -> Self {
        if is_sentinel(tab_id) {
            Self::ClearToDefaults
        } else {
            Self::LoadSession(tab_id.to_string())
        }
    }
}

/// Ordered tab list plus the active id, as returned by [`TabRegistry::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSnapshot {
    pub tabs: Vec<Tab>,
    pub active_id: String,
}

#[derive(Debug)]
struct TabState {
    /// The sentinel is always at index 0.
    tabs: Vec<Tab>,
    active_id: String,
}

impl TabState {
    fn position(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id == tab_id)
    }

    /// Inserts or relabels a session tab. Returns whether a tab was created.
    fn upsert(&mut self, thread_id: &str, label: &str, origin_tab_id: &str) -> bool {
        if let Some(index) = self.position(thread_id) {
            let tab = &mut self.tabs[index];
            tab.label = label.to_string();
            tab.closable = true;
            return false;
        }
        let tab = Tab::session(thread_id, label);
        if is_sentinel(origin_tab_id) {
            self.tabs.insert(1, tab);
        } else {
            self.tabs.push(tab);
        }
        true
    }
}

/// Single source of truth for which tabs exist and which one is active.
///
/// Every mutation of the active pointer happens synchronously, under the
/// registry's lock, before any data for the new tab is loaded. The resulting
/// directive is handed to the injected requesters after the lock is
/// released, and also returned to the caller.
pub struct TabRegistry {
    state: Mutex<TabState>,
    clear_requester: Weak<dyn ClearRequester>,
    load_requester: Weak<dyn SessionLoadRequester>,
}

impl TabRegistry {
    /// Creates a registry holding only the New Chat tab, active.
    ///
    /// # Arguments
    ///
    /// * `clear_requester` - Receives `ClearToDefaults` directives
    /// * `load_requester` - Receives `LoadSession` directives
    ///
    /// Requesters that have been dropped are skipped silently.
    pub fn new(
        clear_requester: Weak<dyn ClearRequester>,
        load_requester: Weak<dyn SessionLoadRequester>,
    ) -> Self {
        Self {
            state: Mutex::new(TabState {
                tabs: vec![Tab::new_chat()],
                active_id: SENTINEL_NEW_CHAT.to_string(),
            }),
            clear_requester,
            load_requester,
        }
    }

    /// Returns the ordered tab list and the active id.
    pub fn open(&self) -> TabSnapshot {
        let state = lock(&self.state);
        TabSnapshot {
            tabs: state.tabs.clone(),
            active_id: state.active_id.clone(),
        }
    }

    pub fn active_id(&self) -> String {
        lock(&self.state).active_id.clone()
    }

    pub fn contains(&self, tab_id: &str) -> bool {
        lock(&self.state).position(tab_id).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).tabs.is_empty()
    }

    /// Makes `tab_id` the active tab.
    ///
    /// # Returns
    ///
    /// `None` when the tab was already active, otherwise the directive that
    /// was dispatched.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if no tab has this id.
    pub fn select(&self, tab_id: &str) -> Result<Option<TabDirective>> {
        let directive = {
            let mut state = lock(&self.state);
            if state.position(tab_id).is_none() {
                return Err(ChatError::invalid_operation(format!(
                    "No open tab with id '{tab_id}'"
                )));
            }
            if state.active_id == tab_id {
                return Ok(None);
            }
            tracing::debug!(
                "[TabRegistry] select {} (was {})",
                tab_id,
                state.active_id
            );
            state.active_id = tab_id.to_string();
            TabDirective::for_tab(tab_id)
        };
        self.dispatch(&directive);
        Ok(Some(directive))
    }

    /// Removes a session tab.
    ///
    /// If the removed tab was active, its left neighbour becomes active when
    /// that neighbour is a session tab, otherwise the New Chat tab does.
    ///
    /// # Returns
    ///
    /// The directive for the newly active tab, or `None` when the active tab
    /// did not change.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` for the New Chat tab or an unknown id; the tab list
    /// is left unchanged.
    pub fn close(&self, tab_id: &str) -> Result<Option<TabDirective>> {
        if is_sentinel(tab_id) {
            return Err(ChatError::invalid_operation("The New Chat tab cannot be closed"));
        }
        let directive = {
            let mut state = lock(&self.state);
            let Some(index) = state.position(tab_id) else {
                return Err(ChatError::invalid_operation(format!(
                    "No open tab with id '{tab_id}'"
                )));
            };
            state.tabs.remove(index);
            tracing::info!("[TabRegistry] closed tab {}", tab_id);

            if state.active_id != tab_id {
                None
            } else {
                let left = &state.tabs[index - 1];
                let next = if left.is_sentinel() {
                    SENTINEL_NEW_CHAT.to_string()
                } else {
                    left.id.clone()
                };
                state.active_id = next.clone();
                Some(TabDirective::for_tab(&next))
            }
        };
        if let Some(directive) = &directive {
            self.dispatch(directive);
        }
        Ok(directive)
    }

    /// Changes a session tab's label. No data is reloaded.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` for the New Chat tab, an unknown id or a blank label.
    pub fn rename(&self, tab_id: &str, new_label: &str) -> Result<()> {
        if is_sentinel(tab_id) {
            return Err(ChatError::invalid_operation("The New Chat tab cannot be renamed"));
        }
        if new_label.trim().is_empty() {
            return Err(ChatError::invalid_operation("Tab label cannot be empty"));
        }
        let mut state = lock(&self.state);
        let Some(index) = state.position(tab_id) else {
            return Err(ChatError::invalid_operation(format!(
                "No open tab with id '{tab_id}'"
            )));
        };
        state.tabs[index].label = new_label.to_string();
        Ok(())
    }

    /// Upserts a tab for `thread_id` and makes it active.
    ///
    /// An existing tab only has its label updated. A new tab goes right after
    /// New Chat when `origin_tab_id` is the New Chat tab, otherwise at the
    /// end. The load directive is dispatched even if the tab was already
    /// active, so a pending transition record is consumed.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if `thread_id` is the New Chat id.
    pub fn add_session_tab(
        &self,
        thread_id: &str,
        label: &str,
        origin_tab_id: &str,
    ) -> Result<TabDirective> {
        Self::check_session_id(thread_id)?;
        {
            let mut state = lock(&self.state);
            if state.upsert(thread_id, label, origin_tab_id) {
                tracing::info!(
                    "[TabRegistry] added tab {} (origin {})",
                    thread_id,
                    origin_tab_id
                );
            }
            state.active_id = thread_id.to_string();
        }
        let directive = TabDirective::LoadSession(thread_id.to_string());
        self.dispatch(&directive);
        Ok(directive)
    }

    /// Upserts a tab for `thread_id` without touching the active pointer.
    ///
    /// Used when a session is created by a send the user has navigated away
    /// from.
    pub fn register_session_tab(
        &self,
        thread_id: &str,
        label: &str,
        origin_tab_id: &str,
    ) -> Result<()> {
        Self::check_session_id(thread_id)?;
        let mut state = lock(&self.state);
        if state.upsert(thread_id, label, origin_tab_id) {
            tracing::info!(
                "[TabRegistry] registered background tab {} (origin {})",
                thread_id,
                origin_tab_id
            );
        }
        Ok(())
    }

    /// Replaces every session tab with `tabs`, in order.
    ///
    /// Duplicate ids and New Chat entries are dropped. If the active tab is
    /// not among the restored ones, New Chat becomes active.
    pub fn restore_tabs(&self, tabs: Vec<Tab>) -> Option<TabDirective> {
        let directive = {
            let mut state = lock(&self.state);
            let mut seen = HashSet::new();
            let mut restored = vec![Tab::new_chat()];
            for mut tab in tabs {
                if tab.is_sentinel() || !seen.insert(tab.id.clone()) {
                    continue;
                }
                tab.closable = true;
                restored.push(tab);
            }
            state.tabs = restored;
            tracing::info!("[TabRegistry] restored {} tab(s)", state.tabs.len() - 1);

            let active_id = state.active_id.clone();
            if state.position(&active_id).is_some() {
                None
            } else {
                state.active_id = SENTINEL_NEW_CHAT.to_string();
                Some(TabDirective::ClearToDefaults)
            }
        };
        if let Some(directive) = &directive {
            self.dispatch(directive);
        }
        directive
    }

    /// Discards every session tab and activates New Chat.
    pub fn reset_to_default(&self) -> TabDirective {
        {
            let mut state = lock(&self.state);
            state.tabs.truncate(1);
            state.active_id = SENTINEL_NEW_CHAT.to_string();
        }
        tracing::info!("[TabRegistry] reset to New Chat");
        let directive = TabDirective::ClearToDefaults;
        self.dispatch(&directive);
        directive
    }

    fn check_session_id(thread_id: &str) -> Result<()> {
        if thread_id.is_empty() || is_sentinel(thread_id) {
            return Err(ChatError::invalid_operation(format!(
                "'{thread_id}' is not a session id"
            )));
        }
        Ok(())
    }

    fn dispatch(&self, directive: &TabDirective) {
        match directive {
            TabDirective::ClearToDefaults => {
                if let Some(requester) = self.clear_requester.upgrade() {
                    requester.request_clear();
                }
            }
            TabDirective::LoadSession(thread_id) => {
                if let Some(requester) = self.load_requester.upgrade() {
                    requester.request_session_load(thread_id);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
