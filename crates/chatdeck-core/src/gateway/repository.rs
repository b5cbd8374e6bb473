//! Session gateway trait.
//!
//! Defines the interface to the remote session store.

use super::model::{EditAck, SendTurnPayload, SendTurnResponse, SessionSnapshot, SessionSummary};
use crate::error::Result;
use crate::settings::SessionSettings;
use async_trait::async_trait;

/// An abstract client for the remote session store.
///
/// This trait decouples the coordinator from the transport (HTTP + JSON in
/// production, in-memory mocks in tests).
///
/// # Implementation Notes
///
/// - Every failure, timeouts included, is reported as `ChatError::Gateway`.
/// - The `detail` of a gateway error is the store's own message when it sent
///   one, otherwise a generic text embedding the transport status.
/// - Implementations must not retry internally.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Fetches the full snapshot of a session.
    async fn fetch_session(&self, thread_id: &str) -> Result<SessionSnapshot>;

    /// Sends one turn, creating a session when `payload.thread_id` is `None`.
    async fn send_turn(&self, payload: SendTurnPayload) -> Result<SendTurnResponse>;

    /// Replaces the content of the message at `index` in a session.
    async fn edit_message(&self, thread_id: &str, index: usize, new_content: &str)
    -> Result<EditAck>;

    /// Lists saved sessions.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// Applies `settings` as the backend's standing defaults.
    async fn update_default_settings(&self, settings: &SessionSettings) -> Result<()>;

    /// Changes the stored title of a session.
    async fn rename_session(&self, thread_id: &str, title: &str) -> Result<()>;

    /// Deletes a session from the store.
    async fn delete_session(&self, thread_id: &str) -> Result<()>;
}
