use super::coordinator::{ChatStateCoordinator, CoordinatorState, PendingSend};
use super::event::ChatEvent;
use crate::sync::lock;
use chatdeck_core::error::{ChatError, Result};
use chatdeck_core::gateway::{SendTurnPayload, SendTurnResponse};
use chatdeck_core::tab::{is_sentinel, label_from_draft};
use chatdeck_core::{ChatStatus, Message, SessionSettings, TransitionRecord};

/// Result of [`ChatStateCoordinator::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The draft was empty or whitespace-only; nothing happened.
    Ignored,
    Sent {
        thread_id: String,
        /// The reply bound a session the origin tab was not bound to.
        new_tab: bool,
        /// The reply was written to the view. `false` when the origin tab was
        /// cleared, or was not the active tab when the reply arrived.
        applied: bool,
    },
}

/// Result of a read-after-write confirmation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// A consistent snapshot was fetched on attempt `attempts`.
    Confirmed { attempts: u32 },
    /// Every attempt failed or returned a lagging snapshot.
    Exhausted { attempts: u32 },
}

/// What a pending send needs to know when its reply arrives.
struct SendTicket {
    origin: String,
    bound: Option<String>,
    placeholder_id: String,
    settings: SessionSettings,
    draft: String,
    /// History at send time, optimistic user turn included.
    history: Vec<Message>,
}

impl ChatStateCoordinator {
    /// Sends `draft` from the active tab.
    ///
    /// The user turn and a pending assistant placeholder are shown right
    /// away. On success the placeholder is replaced by the reply. A reply
    /// carrying a session id the tab was not bound to opens (or focuses) a
    /// tab for that session, seeded from the transition buffer.
    ///
    /// # Returns
    ///
    /// `SendOutcome::Ignored` for a blank draft.
    ///
    /// # Errors
    ///
    /// - `NotReady` if the backend has not loaded a model
    /// - `SendInProgress` if a send is already pending on this tab, even one
    ///   started before the tab was left and re-entered
    /// - `InvalidOperation` while the tab is still loading
    /// - `Gateway` when the store fails; the user turn stays visible and the
    ///   view moves to `Error`
    pub async fn send_message(&self, draft: &str) -> Result<SendOutcome> {
        if draft.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        let (ticket, payload) = self.begin_send(draft)?;
        tracing::debug!(
            "[ChatStateCoordinator] sending from {} (thread {:?}, {} mode)",
            ticket.origin,
            ticket.bound,
            self.mode
        );
        self.emit(ChatEvent::StatusChanged {
            tab_id: ticket.origin.clone(),
            status: ChatStatus::Sending,
        });
        self.emit(ChatEvent::ScrollToLatest {
            tab_id: ticket.origin.clone(),
        });

        match self.gateway.send_turn(payload).await {
            Ok(response) => self.complete_send(ticket, response),
            Err(e) => Err(self.fail_send(ticket, e)),
        }
    }

    fn begin_send(&self, draft: &str) -> Result<(SendTicket, SendTurnPayload)> {
        let mut state = lock(&self.state);
        if !state.backend.is_ready() {
            state.view.error = Some(ChatError::NotReady.to_string());
            return Err(ChatError::NotReady);
        }
        match state.view.status {
            ChatStatus::Sending => return Err(ChatError::SendInProgress),
            ChatStatus::Loading => {
                return Err(ChatError::invalid_operation("Session is still loading"));
            }
            ChatStatus::Idle | ChatStatus::Error => {}
        }
        if state.pending_sends.contains_key(&state.view.tab_id) {
            return Err(ChatError::SendInProgress);
        }

        let settings = Self::effective_settings(&state);
        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id.clone();

        state.view.history.push(Message::user(draft));
        let history = state.view.history.clone();
        state.view.history.push(placeholder);
        state.view.status = ChatStatus::Sending;
        state.view.error = None;

        let bound = state.view.thread_id.clone();
        let origin = state.view.tab_id.clone();
        let pending = PendingSend {
            placeholder_id: placeholder_id.clone(),
            thread_id: bound.clone(),
            history: state.view.history.clone(),
            session_settings: state.view.session_settings.clone(),
        };
        state.pending_sends.insert(origin.clone(), pending);

        let payload = SendTurnPayload::build(self.mode, draft, &history, bound.clone(), &settings);
        let ticket = SendTicket {
            origin,
            bound,
            placeholder_id,
            settings,
            draft: draft.to_string(),
            history,
        };
        Ok((ticket, payload))
    }

    /// Whether the origin tab is shown and still owns this send. Leaving and
    /// re-entering the tab keeps ownership; clearing it does not.
    fn is_current(&self, state: &CoordinatorState, ticket: &SendTicket) -> bool {
        state.view.tab_id == ticket.origin
            && self.tabs.active_id() == ticket.origin
            && Self::owns_pending(state, ticket)
    }

    fn owns_pending(state: &CoordinatorState, ticket: &SendTicket) -> bool {
        state
            .pending_sends
            .get(&ticket.origin)
            .is_some_and(|pending| pending.placeholder_id == ticket.placeholder_id)
    }

    fn release_pending(state: &mut CoordinatorState, ticket: &SendTicket) {
        if Self::owns_pending(state, ticket) {
            state.pending_sends.remove(&ticket.origin);
        }
    }

    fn complete_send(&self, ticket: SendTicket, response: SendTurnResponse) -> Result<SendOutcome> {
        let Some(thread_id) = response
            .thread_id
            .clone()
            .filter(|id| !id.is_empty() && !is_sentinel(id))
        else {
            return Err(self.fail_send(
                ticket,
                ChatError::gateway("Response did not carry a session id"),
            ));
        };
        let tokens = response.reported_tokens();
        let assistant = Message::assistant(response.response, tokens);
        let new_tab = ticket.bound.as_deref() != Some(thread_id.as_str());

        let (applied, history) = {
            let mut state = lock(&self.state);
            let current = self.is_current(&state, &ticket);
            Self::release_pending(&mut state, &ticket);
            if current {
                state
                    .view
                    .history
                    .retain(|msg| msg.id != ticket.placeholder_id);
                state.view.history.push(assistant);
                state.view.status = ChatStatus::Idle;
                state.view.error = None;
                (true, state.view.history.clone())
            } else {
                let mut history = ticket.history.clone();
                history.push(assistant);
                (false, history)
            }
        };
        let expected_turns = history.len();
        self.buffer.put(TransitionRecord::new(
            &thread_id,
            history,
            Some(ticket.settings.clone()),
        ));

        if applied {
            self.emit(ChatEvent::StatusChanged {
                tab_id: ticket.origin.clone(),
                status: ChatStatus::Idle,
            });
            self.emit(ChatEvent::ScrollToLatest {
                tab_id: ticket.origin.clone(),
            });
        } else {
            tracing::warn!(
                "[ChatStateCoordinator] reply for {} arrived after leaving tab {}; kept in buffer",
                thread_id,
                ticket.origin
            );
        }

        if new_tab {
            tracing::info!(
                "[ChatStateCoordinator] tab {} bound to session {}",
                ticket.origin,
                thread_id
            );
            self.emit(ChatEvent::TabBound {
                thread_id: thread_id.clone(),
                origin_tab_id: ticket.origin.clone(),
            });
            let label = label_from_draft(ticket.draft.trim());
            if applied {
                self.tabs
                    .add_session_tab(&thread_id, &label, &ticket.origin)?;
            } else {
                self.tabs
                    .register_session_tab(&thread_id, &label, &ticket.origin)?;
            }
            self.schedule_confirmation(&thread_id, expected_turns);
        }

        Ok(SendOutcome::Sent {
            thread_id,
            new_tab,
            applied,
        })
    }

    fn fail_send(&self, ticket: SendTicket, error: ChatError) -> ChatError {
        tracing::warn!(
            "[ChatStateCoordinator] send from {} failed: {}",
            ticket.origin,
            error
        );
        let applied = {
            let mut state = lock(&self.state);
            let current = self.is_current(&state, &ticket);
            Self::release_pending(&mut state, &ticket);
            if current {
                state
                    .view
                    .history
                    .retain(|msg| msg.id != ticket.placeholder_id);
                state.view.status = ChatStatus::Error;
                state.view.error = Some(error.detail());
                true
            } else {
                false
            }
        };
        if applied {
            self.emit(ChatEvent::StatusChanged {
                tab_id: ticket.origin,
                status: ChatStatus::Error,
            });
        }
        error
    }

    // ============================================================================
    // Read-after-write confirmation
    // ============================================================================

    fn schedule_confirmation(&self, thread_id: &str, expected_turns: usize) {
        if !self.confirmation.is_enabled() {
            return;
        }
        let Some(me) = self.me.upgrade() else {
            return;
        };
        let thread_id = thread_id.to_string();
        let spawned = self.spawn(async move {
            me.confirm_session(&thread_id, expected_turns).await;
        });
        if let Err(e) = spawned {
            tracing::warn!("[ChatStateCoordinator] confirmation not scheduled: {}", e);
        }
    }

    /// Re-fetches a freshly bound session until the store serves a snapshot
    /// holding at least `expected_turns` turns (or as many as are currently
    /// shown or buffered, if more).
    ///
    /// Attempts follow the confirmation policy's delays. The first
    /// consistent snapshot is applied under the stale-response rule and ends
    /// the run; lagging snapshots and failures are retried. On exhaustion
    /// the local copy is left in place.
    pub async fn confirm_session(&self, thread_id: &str, expected_turns: usize) -> ConfirmationOutcome {
        let mut attempts = 0;
        for delay in self.confirmation.delays() {
            tokio::time::sleep(delay).await;
            attempts += 1;

            let snapshot = match self.gateway.fetch_session(thread_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(
                        "[ChatStateCoordinator] confirmation {} of {} for {} failed: {}",
                        attempts,
                        self.confirmation.max_attempts,
                        thread_id,
                        e
                    );
                    continue;
                }
            };

            let events = {
                let mut state = lock(&self.state);
                let required = expected_turns.max(self.known_turns(&state, thread_id));
                if snapshot.messages.len() >= required {
                    Some(self.apply_snapshot(&mut state, thread_id, snapshot))
                } else {
                    tracing::debug!(
                        "[ChatStateCoordinator] store lags for {}: {} of {} turns",
                        thread_id,
                        snapshot.messages.len(),
                        required
                    );
                    None
                }
            };
            if let Some(events) = events {
                self.emit_all(events);
                tracing::debug!(
                    "[ChatStateCoordinator] confirmed {} after {} attempt(s)",
                    thread_id,
                    attempts
                );
                return ConfirmationOutcome::Confirmed { attempts };
            }
        }

        tracing::warn!(
            "[ChatStateCoordinator] could not confirm {} after {} attempt(s); keeping local copy",
            thread_id,
            attempts
        );
        ConfirmationOutcome::Exhausted { attempts }
    }

    fn known_turns(&self, state: &CoordinatorState, thread_id: &str) -> usize {
        if state.view.tab_id == thread_id {
            state.view.settled_turns()
        } else {
            self.buffer.turns(thread_id).unwrap_or(0)
        }
    }
}
