//! Error types for chatdeck.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared error type for every chatdeck operation.
///
/// Validation variants (`InvalidOperation`, `InvalidThread`, `InvalidContent`,
/// `InvalidIndex`, `InvalidSettings`) are raised before any state is touched.
/// `Gateway` covers every failure of the remote session store, timeouts
/// included.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatError {
    /// An action was attempted before the inference backend was loaded.
    #[error("Model is not loaded. Cannot send message.")]
    NotReady,

    /// Illegal tab mutation (closing or renaming the New Chat tab, unknown tab).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Edit target is not a bound session.
    #[error("Cannot edit message: No valid thread ID")]
    InvalidThread,

    /// Edit content is empty or whitespace-only.
    #[error("Message content cannot be empty")]
    InvalidContent,

    /// Edit index is negative.
    #[error("Invalid message index: {0}")]
    InvalidIndex(i64),

    /// Generation settings outside their allowed range.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// A send is already pending on the active tab.
    #[error("A message is already being sent on this tab")]
    SendInProgress,

    /// Network or remote store failure.
    #[error("{detail}")]
    Gateway {
        detail: String,
        /// HTTP status code when the failure came from a response.
        status: Option<u16>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidOperation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Creates an InvalidSettings error
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings(message.into())
    }

    /// Creates a Gateway error with no transport status
    pub fn gateway(detail: impl Into<String>) -> Self {
        Self::Gateway {
            detail: detail.into(),
            status: None,
        }
    }

    /// Creates a Gateway error carrying the transport status code
    pub fn gateway_with_status(detail: impl Into<String>, status: u16) -> Self {
        Self::Gateway {
            detail: detail.into(),
            status: Some(status),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Gateway error
    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }

    /// Check if this error was raised by input validation.
    ///
    /// Validation errors never mutate coordinator or registry state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperation(_)
                | Self::InvalidThread
                | Self::InvalidContent
                | Self::InvalidIndex(_)
                | Self::InvalidSettings(_)
        )
    }

    /// Human-readable detail suitable for inline status text.
    pub fn detail(&self) -> String {
        match self {
            Self::Gateway { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ChatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ChatError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ChatError>`.
pub type Result<T> = std::result::Result<T, ChatError>;
