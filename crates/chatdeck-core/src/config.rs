//! Configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer; every field has a
//! default so a missing or partial file is valid.

use crate::gateway::ConversationMode;
use crate::settings::SessionSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub conversation_mode: ConversationMode,
    pub new_chat_defaults: SessionSettings,
    pub confirmation: ConfirmationConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 120,
            conversation_mode: ConversationMode::default(),
            new_chat_defaults: SessionSettings::default(),
            confirmation: ConfirmationConfig::default(),
        }
    }
}

impl ChatConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Bounded retry used to confirm a freshly created session against the store.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Number of confirmation loads after a tab binding; 0 disables them.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay_ms: 150,
            backoff_factor: 2.0,
            max_delay_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ChatConfig = toml::from_str(
            r#"
            api_base_url = "http://10.0.0.2:9000"
            conversation_mode = "instruction"

            [confirmation]
            max_attempts = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.2:9000");
        assert_eq!(config.conversation_mode, ConversationMode::Instruction);
        assert_eq!(config.confirmation.max_attempts, 0);
        assert_eq!(config.confirmation.initial_delay_ms, 150);
        assert_eq!(config.new_chat_defaults, SessionSettings::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }
}
