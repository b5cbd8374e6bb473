//! Generation settings attached to a conversation.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.95;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_REPETITION_PENALTY: f64 = 1.0;

/// Generation parameters for one conversation.
///
/// Two roles exist for this type: the new-chat defaults (template used for
/// tabs with no bound session) and the per-session settings hydrated from the
/// server when a session tab is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub system_prompt: String,
    /// Sampling temperature, `0.0..=2.0`.
    pub temperature: f64,
    /// Nucleus sampling mass, `0.0..=1.0`.
    pub top_p: f64,
    /// Maximum number of new tokens, at least 1.
    pub max_tokens: u32,
    /// Repetition penalty, at least 1.0.
    pub repetition_penalty: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
            repetition_penalty: DEFAULT_REPETITION_PENALTY,
        }
    }
}

impl SessionSettings {
    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::invalid_settings(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ChatError::invalid_settings(format!(
                "top_p must be within [0, 1], got {}",
                self.top_p
            )));
        }
        if self.max_tokens < 1 {
            return Err(ChatError::invalid_settings("max_tokens must be at least 1"));
        }
        if self.repetition_penalty.is_nan() || self.repetition_penalty < 1.0 {
            return Err(ChatError::invalid_settings(format!(
                "repetition_penalty must be at least 1.0, got {}",
                self.repetition_penalty
            )));
        }
        Ok(())
    }

    /// Returns a copy with a different system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Returns a copy with a different temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Returns a copy with a different token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
