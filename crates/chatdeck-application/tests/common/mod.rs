//! Shared fixtures for coordinator integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chatdeck_application::ChatStateCoordinator;
use chatdeck_core::config::{ChatConfig, ConfirmationConfig};
use chatdeck_core::error::{ChatError, Result};
use chatdeck_core::gateway::{
    EditAck, SamplingSettings, SendTurnPayload, SendTurnResponse, SessionGateway, SessionSnapshot,
    SessionSummary, SnapshotMessage,
};
use chatdeck_core::{BackendStatus, MessageRole, SessionSettings};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// In-memory session store with per-request gates.
///
/// A gated request blocks until the matching sender fires (or is dropped),
/// which lets a test decide the order in which responses resolve.
#[derive(Default)]
pub struct MockGateway {
    /// Successive versions of each session; a fetch pops the front until
    /// only the last version remains.
    sessions: Mutex<HashMap<String, VecDeque<SessionSnapshot>>>,
    fetch_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    fetch_failures: Mutex<HashMap<String, ChatError>>,
    fetch_calls: Mutex<Vec<String>>,
    send_gate: Mutex<Option<oneshot::Receiver<()>>>,
    send_replies: Mutex<VecDeque<Result<SendTurnResponse>>>,
    sent: Mutex<Vec<SendTurnPayload>>,
    edit_reply: Mutex<Option<Result<EditAck>>>,
    edits: Mutex<Vec<(String, usize, String)>>,
    applied_settings: Mutex<Vec<SessionSettings>>,
    renamed: Mutex<Vec<(String, String)>>,
    deleted: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds a version of session `thread_id` served by later fetches.
    pub fn insert_session(&self, snapshot: SessionSnapshot) {
        self.sessions
            .lock()
            .unwrap()
            .entry(snapshot.thread_id.clone())
            .or_default()
            .push_back(snapshot);
    }

    /// Blocks the next fetch of `thread_id` until the returned sender fires.
    pub fn gate_fetch(&self, thread_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.fetch_gates
            .lock()
            .unwrap()
            .insert(thread_id.to_string(), rx);
        tx
    }

    pub fn fail_fetch(&self, thread_id: &str, error: ChatError) {
        self.fetch_failures
            .lock()
            .unwrap()
            .insert(thread_id.to_string(), error);
    }

    pub fn fetch_count(&self, thread_id: &str) -> usize {
        self.fetch_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == thread_id)
            .count()
    }

    /// Blocks the next send until the returned sender fires.
    pub fn gate_send(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.send_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Queues the reply of the next send.
    pub fn reply_to_send(&self, reply: Result<SendTurnResponse>) {
        self.send_replies.lock().unwrap().push_back(reply);
    }

    pub fn sent(&self) -> Vec<SendTurnPayload> {
        self.sent.lock().unwrap().clone()
    }

    pub fn reply_to_edit(&self, reply: Result<EditAck>) {
        *self.edit_reply.lock().unwrap() = Some(reply);
    }

    pub fn edits(&self) -> Vec<(String, usize, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn applied_settings(&self) -> Vec<SessionSettings> {
        self.applied_settings.lock().unwrap().clone()
    }

    pub fn renamed(&self) -> Vec<(String, String)> {
        self.renamed.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionGateway for MockGateway {
    async fn fetch_session(&self, thread_id: &str) -> Result<SessionSnapshot> {
        self.fetch_calls.lock().unwrap().push(thread_id.to_string());
        let gate = self.fetch_gates.lock().unwrap().remove(thread_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if let Some(error) = self.fetch_failures.lock().unwrap().get(thread_id) {
            return Err(error.clone());
        }
        let mut sessions = self.sessions.lock().unwrap();
        let versions = sessions
            .get_mut(thread_id)
            .ok_or_else(|| ChatError::gateway_with_status("Session not found", 404))?;
        if versions.len() > 1 {
            versions
                .pop_front()
                .ok_or_else(|| ChatError::internal("no versions"))
        } else {
            versions
                .front()
                .cloned()
                .ok_or_else(|| ChatError::internal("no versions"))
        }
    }

    async fn send_turn(&self, payload: SendTurnPayload) -> Result<SendTurnResponse> {
        self.sent.lock().unwrap().push(payload);
        let gate = self.send_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.send_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::gateway("no reply scripted")))
    }

    async fn edit_message(
        &self,
        thread_id: &str,
        index: usize,
        new_content: &str,
    ) -> Result<EditAck> {
        let reply = self
            .edit_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Ok(EditAck { success: true }));
        if reply.is_ok() {
            self.edits
                .lock()
                .unwrap()
                .push((thread_id.to_string(), index, new_content.to_string()));
        }
        reply
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.lock().unwrap();
        let mut summaries: Vec<_> = sessions
            .keys()
            .map(|thread_id| SessionSummary {
                thread_id: thread_id.clone(),
                title: None,
            })
            .collect();
        summaries.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
        Ok(summaries)
    }

    async fn update_default_settings(&self, settings: &SessionSettings) -> Result<()> {
        self.applied_settings.lock().unwrap().push(settings.clone());
        Ok(())
    }

    async fn rename_session(&self, thread_id: &str, title: &str) -> Result<()> {
        self.renamed
            .lock()
            .unwrap()
            .push((thread_id.to_string(), title.to_string()));
        Ok(())
    }

    async fn delete_session(&self, thread_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(thread_id.to_string());
        self.sessions.lock().unwrap().remove(thread_id);
        Ok(())
    }
}

/// Snapshot of `thread_id` holding `turns`, alternating user/assistant.
pub fn snapshot(thread_id: &str, turns: &[&str]) -> SessionSnapshot {
    let messages = turns
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let role = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            };
            SnapshotMessage::new(role, *content)
        })
        .collect();
    SessionSnapshot {
        thread_id: thread_id.to_string(),
        messages,
        title: None,
        system_prompt: None,
        sampling_settings: None,
    }
}

/// Same as [`snapshot`] with stored settings.
pub fn snapshot_with_settings(
    thread_id: &str,
    turns: &[&str],
    system_prompt: &str,
    temperature: f64,
) -> SessionSnapshot {
    SessionSnapshot {
        system_prompt: Some(system_prompt.to_string()),
        sampling_settings: Some(SamplingSettings {
            temperature: Some(temperature),
            ..Default::default()
        }),
        ..snapshot(thread_id, turns)
    }
}

pub fn config(confirmation_attempts: u32) -> ChatConfig {
    ChatConfig {
        confirmation: ConfirmationConfig {
            max_attempts: confirmation_attempts,
            ..ConfirmationConfig::default()
        },
        ..ChatConfig::default()
    }
}

/// Coordinator with a loaded backend and confirmation loads disabled.
pub fn ready_coordinator(gateway: &Arc<MockGateway>) -> Arc<ChatStateCoordinator> {
    ready_coordinator_with(gateway, config(0))
}

pub fn ready_coordinator_with(
    gateway: &Arc<MockGateway>,
    config: ChatConfig,
) -> Arc<ChatStateCoordinator> {
    let coordinator = ChatStateCoordinator::new(gateway.clone(), &config);
    coordinator.set_backend_status(BackendStatus::Loaded);
    coordinator
}

/// Lets woken background tasks run to completion on the test runtime.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn contents(coordinator: &ChatStateCoordinator) -> Vec<String> {
    coordinator
        .view()
        .history
        .into_iter()
        .map(|msg| msg.content)
        .collect()
}
