use super::editor::{HistoryEditSink, MessageEditor};
use super::event::ChatEvent;
use super::view::ChatView;
use crate::confirmation::ConfirmationPolicy;
use crate::sync::lock;
use crate::tabs::TabRegistry;
use crate::transition_buffer::TransitionBuffer;
use chatdeck_core::config::ChatConfig;
use chatdeck_core::error::{ChatError, Result};
use chatdeck_core::gateway::{ConversationMode, SessionGateway, SessionSnapshot};
use chatdeck_core::requester::{ClearRequester, SessionLoadRequester};
use chatdeck_core::tab::is_sentinel;
use chatdeck_core::{BackendStatus, ChatStatus, Message, SessionSettings, TransitionRecord};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const EVENT_CAPACITY: usize = 64;

/// How a load request was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A transition record was consumed; no network call was made.
    FromBuffer,
    /// A fetch was started.
    Fetching,
    /// A fetch for this session was already pending; its result will be used.
    AlreadyInFlight,
    /// A send from this tab is still pending; its reply fills the view.
    AwaitingReply,
}

/// A send whose reply has not arrived, kept per origin tab so that leaving
/// and re-entering the tab shows it again.
pub(super) struct PendingSend {
    pub(super) placeholder_id: String,
    pub(super) thread_id: Option<String>,
    /// History at send time, placeholder included.
    pub(super) history: Vec<Message>,
    pub(super) session_settings: Option<SessionSettings>,
}

impl PendingSend {
    fn resume_view(&self, tab_id: &str) -> ChatView {
        ChatView {
            tab_id: tab_id.to_string(),
            thread_id: self.thread_id.clone(),
            history: self.history.clone(),
            session_settings: self.session_settings.clone(),
            status: ChatStatus::Sending,
            error: None,
        }
    }
}

pub(super) struct CoordinatorState {
    pub(super) view: ChatView,
    /// Pending sends by origin tab id. Clearing a tab drops its entry.
    pub(super) pending_sends: HashMap<String, PendingSend>,
    pub(super) backend: BackendStatus,
    pub(super) new_chat_defaults: SessionSettings,
    /// Sessions with a fetch pending.
    pub(super) in_flight: HashSet<String>,
}

/// Orchestrates sending, loading and clearing of the conversation shown for
/// the active tab.
///
/// The coordinator owns its [`TabRegistry`] and [`TransitionBuffer`]. The
/// registry reaches back into the coordinator only through the
/// [`ClearRequester`] and [`SessionLoadRequester`] capabilities, held as weak
/// references.
///
/// All state is behind synchronous locks that are never held across an
/// `.await`. Lock order is coordinator state, then registry, then buffer;
/// the registry releases its own lock before dispatching a directive.
pub struct ChatStateCoordinator {
    pub(super) me: Weak<Self>,
    pub(super) gateway: Arc<dyn SessionGateway>,
    pub(super) tabs: Arc<TabRegistry>,
    pub(super) buffer: TransitionBuffer,
    pub(super) confirmation: ConfirmationPolicy,
    pub(super) mode: ConversationMode,
    pub(super) state: Mutex<CoordinatorState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatStateCoordinator {
    /// Creates a coordinator showing an empty New Chat tab.
    ///
    /// # Arguments
    ///
    /// * `gateway` - Client for the remote session store
    /// * `config` - Supplies the conversation mode, new-chat defaults and
    ///   confirmation policy
    pub fn new(gateway: Arc<dyn SessionGateway>, config: &ChatConfig) -> Arc<Self> {
        let confirmation = ConfirmationPolicy::from(&config.confirmation);
        let mode = config.conversation_mode;
        let new_chat_defaults = config.new_chat_defaults.clone();

        Arc::new_cyclic(|me: &Weak<Self>| {
            let clear_requester: Weak<dyn ClearRequester> = me.clone();
            let load_requester: Weak<dyn SessionLoadRequester> = me.clone();
            let (events, _) = broadcast::channel(EVENT_CAPACITY);
            Self {
                me: me.clone(),
                gateway,
                tabs: Arc::new(TabRegistry::new(clear_requester, load_requester)),
                buffer: TransitionBuffer::new(),
                confirmation,
                mode,
                state: Mutex::new(CoordinatorState {
                    view: ChatView::empty(chatdeck_core::SENTINEL_NEW_CHAT, ChatStatus::Idle),
                    pending_sends: HashMap::new(),
                    backend: BackendStatus::default(),
                    new_chat_defaults,
                    in_flight: HashSet::new(),
                }),
                tasks: Mutex::new(Vec::new()),
                events,
            }
        })
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn tabs(&self) -> &Arc<TabRegistry> {
        &self.tabs
    }

    pub fn transition_buffer(&self) -> &TransitionBuffer {
        &self.buffer
    }

    pub fn conversation_mode(&self) -> ConversationMode {
        self.mode
    }

    /// Snapshot of the displayed conversation.
    pub fn view(&self) -> ChatView {
        lock(&self.state).view.clone()
    }

    pub fn status(&self) -> ChatStatus {
        lock(&self.state).view.status
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Builds a message editor that writes accepted edits back into this
    /// coordinator's history.
    pub fn message_editor(self: &Arc<Self>) -> MessageEditor {
        MessageEditor::new(self.gateway.clone(), self.clone())
    }

    // ============================================================================
    // Backend and settings
    // ============================================================================

    pub fn backend_status(&self) -> BackendStatus {
        lock(&self.state).backend
    }

    pub fn set_backend_status(&self, status: BackendStatus) {
        let mut state = lock(&self.state);
        if state.backend != status {
            tracing::info!(
                "[ChatStateCoordinator] backend {} -> {}",
                state.backend,
                status
            );
            state.backend = status;
        }
    }

    pub fn new_chat_defaults(&self) -> SessionSettings {
        lock(&self.state).new_chat_defaults.clone()
    }

    /// Replaces the template used by tabs not yet bound to a session.
    pub fn set_new_chat_defaults(&self, settings: SessionSettings) -> Result<()> {
        settings.validate()?;
        lock(&self.state).new_chat_defaults = settings;
        Ok(())
    }

    /// Settings a send from the active tab would use: the per-session
    /// settings of a bound tab, otherwise the new-chat defaults.
    pub fn settings_in_effect(&self) -> SessionSettings {
        Self::effective_settings(&lock(&self.state))
    }

    pub(super) fn effective_settings(state: &CoordinatorState) -> SessionSettings {
        match (&state.view.thread_id, &state.view.session_settings) {
            (Some(_), Some(settings)) => settings.clone(),
            _ => state.new_chat_defaults.clone(),
        }
    }

    /// Changes the per-session settings of the active bound tab locally.
    ///
    /// # Errors
    ///
    /// `InvalidSettings` for out-of-range values, `InvalidOperation` when the
    /// active tab has no bound session.
    pub fn update_session_settings(&self, settings: SessionSettings) -> Result<()> {
        settings.validate()?;
        let thread_id = {
            let mut state = lock(&self.state);
            let Some(thread_id) = state.view.thread_id.clone() else {
                return Err(ChatError::invalid_operation(
                    "No session is bound to the active tab",
                ));
            };
            state.view.session_settings = Some(settings.clone());
            thread_id
        };
        self.buffer
            .update(&thread_id, |record| record.settings = Some(settings));
        tracing::debug!("[ChatStateCoordinator] updated settings for {}", thread_id);
        Ok(())
    }

    /// Pushes the settings in effect to the backend as its standing defaults.
    pub async fn apply_settings(&self) -> Result<SessionSettings> {
        let settings = self.settings_in_effect();
        settings.validate()?;
        self.gateway.update_default_settings(&settings).await?;
        tracing::info!("[ChatStateCoordinator] applied settings to backend");
        Ok(settings)
    }

    // ============================================================================
    // Session management
    // ============================================================================

    /// Checks whether the store holds previously saved sessions.
    ///
    /// Saved sessions are never opened as tabs automatically.
    pub async fn startup(&self) -> Result<bool> {
        let sessions = self.gateway.list_sessions().await?;
        tracing::info!(
            "[ChatStateCoordinator] {} saved session(s) found",
            sessions.len()
        );
        Ok(!sessions.is_empty())
    }

    /// Renames a session remotely, then relabels its tab if one is open.
    pub async fn rename_session(&self, thread_id: &str, new_name: &str) -> Result<()> {
        Self::check_session_id(thread_id)?;
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ChatError::invalid_operation("Session name cannot be empty"));
        }
        self.gateway.rename_session(thread_id, new_name).await?;
        if self.tabs.contains(thread_id) {
            self.tabs.rename(thread_id, new_name)?;
        }
        Ok(())
    }

    /// Deletes a session remotely, then closes its tab and drops any
    /// transition record for it.
    pub async fn delete_session(&self, thread_id: &str) -> Result<()> {
        Self::check_session_id(thread_id)?;
        self.gateway.delete_session(thread_id).await?;
        self.buffer.remove(thread_id);
        if self.tabs.contains(thread_id) {
            self.tabs.close(thread_id)?;
        }
        tracing::info!("[ChatStateCoordinator] deleted session {}", thread_id);
        Ok(())
    }

    fn check_session_id(thread_id: &str) -> Result<()> {
        if thread_id.is_empty() || is_sentinel(thread_id) {
            return Err(ChatError::invalid_operation(format!(
                "'{thread_id}' is not a session id"
            )));
        }
        Ok(())
    }

    // ============================================================================
    // Clearing
    // ============================================================================

    /// Resets the displayed history to empty and per-session settings to
    /// `None` for the active tab.
    pub fn clear_chat_state_and_settings(&self) {
        let tab_id = self.tabs.active_id();
        {
            let mut state = lock(&self.state);
            state.view = ChatView::empty(&tab_id, ChatStatus::Idle);
            state.pending_sends.remove(&tab_id);
        }
        tracing::debug!("[ChatStateCoordinator] cleared view for {}", tab_id);
        self.emit(ChatEvent::StatusChanged {
            tab_id,
            status: ChatStatus::Idle,
        });
    }

    /// Closes every session tab, drops every transition record and shows an
    /// empty New Chat tab.
    pub fn clear_all(&self) {
        lock(&self.state).pending_sends.clear();
        self.buffer.clear();
        self.tabs.reset_to_default();
    }

    // ============================================================================
    // Loading
    // ============================================================================

    /// Loads `thread_id` for display.
    ///
    /// A pending transition record is consumed synchronously. Otherwise a
    /// fetch is started in the background and its result is applied under
    /// the stale-response rule: only if `thread_id` is still the active tab,
    /// else it goes to the transition buffer.
    ///
    /// Re-entering a tab whose send is still pending shows the pending turn
    /// again and waits for the reply instead of fetching.
    pub fn load_session(&self, thread_id: &str) -> Result<LoadOutcome> {
        Self::check_session_id(thread_id)?;
        self.begin_load(thread_id)
    }

    fn begin_load(&self, thread_id: &str) -> Result<LoadOutcome> {
        let active = self.tabs.active_id();
        let mut events = Vec::new();
        let mut from_buffer = false;
        let mut resumed = false;
        let outcome = {
            let mut state = lock(&self.state);
            if active == thread_id {
                if state.view.tab_id != thread_id {
                    let resumed_view = state
                        .pending_sends
                        .get(thread_id)
                        .map(|pending| pending.resume_view(thread_id));
                    resumed = resumed_view.is_some();
                    if resumed {
                        events.push(ChatEvent::StatusChanged {
                            tab_id: thread_id.to_string(),
                            status: ChatStatus::Sending,
                        });
                    }
                    state.view = resumed_view
                        .unwrap_or_else(|| ChatView::empty(thread_id, ChatStatus::Loading));
                } else if state.view.status != ChatStatus::Sending {
                    state.view.status = ChatStatus::Loading;
                    state.view.error = None;
                }
                if state.view.status == ChatStatus::Loading {
                    if let Some(record) = self.buffer.take(thread_id) {
                        Self::show_record(&mut state.view, record);
                        from_buffer = true;
                        events.push(ChatEvent::StatusChanged {
                            tab_id: thread_id.to_string(),
                            status: ChatStatus::Idle,
                        });
                        events.push(ChatEvent::ScrollToLatest {
                            tab_id: thread_id.to_string(),
                        });
                    } else {
                        events.push(ChatEvent::StatusChanged {
                            tab_id: thread_id.to_string(),
                            status: ChatStatus::Loading,
                        });
                    }
                }
            }

            if resumed {
                LoadOutcome::AwaitingReply
            } else if from_buffer {
                LoadOutcome::FromBuffer
            } else if !state.in_flight.insert(thread_id.to_string()) {
                LoadOutcome::AlreadyInFlight
            } else {
                LoadOutcome::Fetching
            }
        };
        self.emit_all(events);
        tracing::debug!(
            "[ChatStateCoordinator] load {} -> {:?}",
            thread_id,
            outcome
        );

        if outcome == LoadOutcome::Fetching {
            let Some(me) = self.me.upgrade() else {
                return Err(ChatError::internal("Coordinator is shutting down"));
            };
            let thread_id_owned = thread_id.to_string();
            if let Err(e) = self.spawn(me.fetch_and_apply(thread_id_owned)) {
                let events = {
                    let mut state = lock(&self.state);
                    state.in_flight.remove(thread_id);
                    self.apply_load_failure(&mut state, thread_id, &e)
                };
                self.emit_all(events);
                return Err(e);
            }
        }
        Ok(outcome)
    }

    async fn fetch_and_apply(self: Arc<Self>, thread_id: String) {
        let result = self.gateway.fetch_session(&thread_id).await;
        let events = {
            let mut state = lock(&self.state);
            state.in_flight.remove(&thread_id);
            match result {
                Ok(snapshot) => self.apply_snapshot(&mut state, &thread_id, snapshot),
                Err(e) => self.apply_load_failure(&mut state, &thread_id, &e),
            }
        };
        self.emit_all(events);
    }

    /// Whether a result for `thread_id` may be written to the view.
    pub(super) fn displays(&self, state: &CoordinatorState, thread_id: &str) -> bool {
        state.view.tab_id == thread_id
            && state.view.status != ChatStatus::Sending
            && self.tabs.active_id() == thread_id
    }

    /// Applies a fetched snapshot to the view if `thread_id` is displayed;
    /// the snapshot is kept in the transition buffer either way.
    pub(super) fn apply_snapshot(
        &self,
        state: &mut CoordinatorState,
        thread_id: &str,
        snapshot: SessionSnapshot,
    ) -> Vec<ChatEvent> {
        let settings = snapshot.settings_with_fallback(&state.new_chat_defaults);
        let record = TransitionRecord::new(thread_id, snapshot.to_history(), settings);

        if !self.displays(state, thread_id) {
            tracing::warn!(
                "[ChatStateCoordinator] stale load for {} kept in buffer (showing {})",
                thread_id,
                state.view.tab_id
            );
            self.buffer.put(record);
            return Vec::new();
        }

        tracing::debug!(
            "[ChatStateCoordinator] loaded {} ({} turns)",
            thread_id,
            record.history.len()
        );
        Self::show_record(&mut state.view, record.clone());
        self.buffer.put(record);
        vec![
            ChatEvent::StatusChanged {
                tab_id: thread_id.to_string(),
                status: ChatStatus::Idle,
            },
            ChatEvent::ScrollToLatest {
                tab_id: thread_id.to_string(),
            },
        ]
    }

    fn apply_load_failure(
        &self,
        state: &mut CoordinatorState,
        thread_id: &str,
        error: &ChatError,
    ) -> Vec<ChatEvent> {
        tracing::warn!(
            "[ChatStateCoordinator] failed to load {}: {}",
            thread_id,
            error
        );
        if !self.displays(state, thread_id) {
            return Vec::new();
        }
        state.view.history.clear();
        state.view.session_settings = None;
        state.view.status = ChatStatus::Error;
        state.view.error = Some(error.detail());
        vec![ChatEvent::StatusChanged {
            tab_id: thread_id.to_string(),
            status: ChatStatus::Error,
        }]
    }

    fn show_record(view: &mut ChatView, record: TransitionRecord) {
        view.thread_id = Some(record.thread_id);
        view.history = record.history;
        view.session_settings = record.settings;
        view.status = ChatStatus::Idle;
        view.error = None;
    }

    // ============================================================================
    // Background tasks and events
    // ============================================================================

    pub(super) fn spawn<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| ChatError::internal(format!("No async runtime available: {e}")))?;
        let join = handle.spawn(task);
        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(join);
        Ok(())
    }

    /// Waits until every background load and confirmation has finished,
    /// including ones started while waiting.
    pub async fn wait_idle(&self) {
        loop {
            let pending = std::mem::take(&mut *lock(&self.tasks));
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::error!("[ChatStateCoordinator] background task failed: {}", e);
                }
            }
        }
    }

    pub(super) fn emit(&self, event: ChatEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub(super) fn emit_all(&self, events: Vec<ChatEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

impl ClearRequester for ChatStateCoordinator {
    fn request_clear(&self) {
        self.clear_chat_state_and_settings();
    }
}

impl SessionLoadRequester for ChatStateCoordinator {
    fn request_session_load(&self, thread_id: &str) {
        if let Err(e) = self.begin_load(thread_id) {
            tracing::error!(
                "[ChatStateCoordinator] could not load {}: {}",
                thread_id,
                e
            );
        }
    }
}

impl HistoryEditSink for ChatStateCoordinator {
    fn apply_message_edit(&self, thread_id: &str, index: usize, new_content: &str) -> bool {
        let shown = {
            let mut state = lock(&self.state);
            let displayed = state.view.thread_id.as_deref() == Some(thread_id);
            match state.view.history.get_mut(index) {
                Some(message) if displayed => {
                    mark_edited(message, new_content);
                    true
                }
                _ => false,
            }
        };
        self.buffer.update(thread_id, |record| {
            if let Some(message) = record.history.get_mut(index) {
                mark_edited(message, new_content);
            }
        });
        shown
    }
}

fn mark_edited(message: &mut Message, new_content: &str) {
    message.content = new_content.to_string();
    message.edited = true;
}
