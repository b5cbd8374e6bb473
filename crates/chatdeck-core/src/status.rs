//! Status types for the displayed conversation and the inference backend.

use serde::{Deserialize, Serialize};
use strum::Display;

/// State of the conversation shown for the active tab.
///
/// `Idle -> Sending -> (Idle | Error)` for sends,
/// `Idle | Error -> Loading -> (Idle | Error)` for tab switches and reloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChatStatus {
    #[default]
    Idle,
    Sending,
    Loading,
    Error,
}

/// Load state of the model behind the remote session store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackendStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

impl BackendStatus {
    /// Only a loaded model accepts messages.
    pub fn is_ready(self) -> bool {
        self == Self::Loaded
    }
}
