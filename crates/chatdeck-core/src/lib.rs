//! Domain layer for chatdeck.
//!
//! Holds the value types shared by every other crate (tabs, messages,
//! generation settings, session snapshots), the error taxonomy, and the
//! narrow traits through which the application layer talks to the remote
//! session store and to itself.

pub mod config;
pub mod error;
pub mod gateway;
pub mod message;
pub mod reasoning;
pub mod requester;
pub mod settings;
pub mod status;
pub mod tab;
pub mod transition;

pub use error::{ChatError, Result};
pub use gateway::SessionGateway;
pub use message::{Message, MessageRole};
pub use settings::SessionSettings;
pub use status::{BackendStatus, ChatStatus};
pub use tab::{NEW_CHAT_LABEL, SENTINEL_NEW_CHAT, Tab};
pub use transition::TransitionRecord;
