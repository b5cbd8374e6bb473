//! Conversation message types.
//!
//! A `Message` is one displayed chat turn. Its `id` is generated locally and
//! is only unique within the history that currently holds it; reloading a
//! session from the server regenerates every id.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message.
    System,
}

/// A single turn in a tab's displayed history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Locally generated identifier.
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Authoritative or estimated token count.
    pub token_count: Option<u32>,
    /// Set once the message has been edited through the message editor.
    #[serde(default)]
    pub edited: bool,
    /// Placeholder for an assistant reply that is still being generated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
    /// Timestamp when the message was created locally (ISO 8601 format).
    pub timestamp: String,
}

impl Message {
    /// Creates a message with a fresh id.
    pub fn new(role: MessageRole, content: impl Into<String>, token_count: Option<u32>) -> Self {
        Self {
            id: format!("{}-{}", role, Uuid::new_v4()),
            role,
            content: content.into(),
            token_count,
            edited: false,
            pending: false,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Optimistic user turn; the token count is estimated from the text.
    pub fn user(content: impl Into<String>) -> Self {
        let content = content.into();
        let estimate = estimate_tokens(&content).max(1);
        Self::new(MessageRole::User, content, Some(estimate))
    }

    /// Assistant reply, falling back to an estimate when the backend sent no count.
    pub fn assistant(content: impl Into<String>, token_count: Option<u32>) -> Self {
        let content = content.into();
        let tokens = token_count.unwrap_or_else(|| estimate_tokens(&content));
        Self::new(MessageRole::Assistant, content, Some(tokens))
    }

    /// In-progress assistant reply shown while a send is pending.
    pub fn placeholder() -> Self {
        let mut message = Self::new(MessageRole::Assistant, String::new(), None);
        message.id = format!("loading-{}", Uuid::new_v4());
        message.pending = true;
        message
    }

    /// Whether this turn should be sent back to the backend as part of a
    /// reconstructed conversation.
    pub fn is_conversation_turn(&self) -> bool {
        !self.pending
            && !self.content.is_empty()
            && matches!(self.role, MessageRole::User | MessageRole::Assistant)
    }
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count() as u32;
    chars.div_ceil(4)
}
