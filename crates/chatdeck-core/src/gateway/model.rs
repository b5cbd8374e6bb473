//! Wire types exchanged with the remote session store.
//!
//! Field names follow the store's snake_case JSON.

use crate::message::{Message, MessageRole};
use crate::settings::SessionSettings;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// How a send is encoded for the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConversationMode {
    /// Single-turn: only the new message is sent.
    Instruction,
    /// Multi-turn: the full reconstructed turn sequence is sent.
    #[default]
    Chat,
}

/// Sampling parameters as the backend names them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f64>,
}

impl From<&SessionSettings> for SamplingSettings {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            temperature: Some(settings.temperature),
            top_p: Some(settings.top_p),
            max_new_tokens: Some(settings.max_tokens),
            repetition_penalty: Some(settings.repetition_penalty),
        }
    }
}

/// One stored turn inside a session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
}

impl SnapshotMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            token_count: None,
            tokens: None,
        }
    }
}

/// Authoritative server-side view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Empty when the store omitted it; gateways fill in the requested id.
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub messages: Vec<SnapshotMessage>,
    #[serde(default, alias = "custom_title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_settings: Option<SamplingSettings>,
}

impl SessionSnapshot {
    /// Converts stored turns into displayable messages with fresh ids.
    ///
    /// Unknown roles are shown as system turns.
    pub fn to_history(&self) -> Vec<Message> {
        self.messages
            .iter()
            .map(|msg| {
                let role = MessageRole::from_str(&msg.role).unwrap_or(MessageRole::System);
                Message::new(role, msg.content.clone(), msg.token_count.or(msg.tokens))
            })
            .collect()
    }

    /// Settings carried by the snapshot, each missing field taken from
    /// `defaults`. `None` when the snapshot carries no settings at all.
    pub fn settings_with_fallback(&self, defaults: &SessionSettings) -> Option<SessionSettings> {
        if self.system_prompt.is_none() && self.sampling_settings.is_none() {
            return None;
        }
        let sampling = self.sampling_settings.clone().unwrap_or_default();
        Some(SessionSettings {
            system_prompt: self
                .system_prompt
                .clone()
                .filter(|prompt| !prompt.is_empty())
                .unwrap_or_else(|| defaults.system_prompt.clone()),
            temperature: sampling.temperature.unwrap_or(defaults.temperature),
            top_p: sampling.top_p.unwrap_or(defaults.top_p),
            max_tokens: sampling.max_new_tokens.unwrap_or(defaults.max_tokens),
            repetition_penalty: sampling
                .repetition_penalty
                .unwrap_or(defaults.repetition_penalty),
        })
    }
}

/// A `{role, content}` pair of the reconstructed turn sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Request body of a send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTurnPayload {
    pub mode: ConversationMode,
    /// Set in single-turn mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set in multi-turn mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<TurnMessage>>,
    /// Bound session, `None` asks the store to create one.
    pub thread_id: Option<String>,
    pub system_prompt: String,
    pub sampling_settings: SamplingSettings,
}

impl SendTurnPayload {
    /// Builds the request for `draft` on top of `history` (which already
    /// holds the optimistic user turn).
    pub fn build(
        mode: ConversationMode,
        draft: &str,
        history: &[Message],
        thread_id: Option<String>,
        settings: &SessionSettings,
    ) -> Self {
        let (message, messages) = match mode {
            ConversationMode::Instruction => (Some(draft.to_string()), None),
            ConversationMode::Chat => {
                let turns = history
                    .iter()
                    .filter(|msg| msg.is_conversation_turn())
                    .map(|msg| TurnMessage {
                        role: msg.role,
                        content: msg.content.clone(),
                    })
                    .collect();
                (None, Some(turns))
            }
        };
        Self {
            mode,
            message,
            messages,
            thread_id,
            system_prompt: settings.system_prompt.clone(),
            sampling_settings: SamplingSettings::from(settings),
        }
    }
}

/// Token usage block some backends attach to a reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Reply to a send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTurnResponse {
    #[serde(alias = "content")]
    pub response: String,
    /// `None` when the store did not save the turn.
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl SendTurnResponse {
    pub fn new(response: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            thread_id: Some(thread_id.into()),
            token_count: None,
            tokens: None,
            usage: None,
        }
    }

    /// First token count the backend reported, if any.
    pub fn reported_tokens(&self) -> Option<u32> {
        self.token_count
            .or(self.tokens)
            .or_else(|| self.usage.as_ref().and_then(|usage| usage.total_tokens))
    }
}

/// Reply to a message edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAck {
    pub success: bool,
}

/// Entry of the saved-session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub thread_id: String,
    #[serde(default)]
    pub title: Option<String>,
}
