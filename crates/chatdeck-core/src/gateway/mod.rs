//! Remote session gateway.
//!
//! # Module Structure
//!
//! - `model`: wire types exchanged with the session store (`SessionSnapshot`, `SendTurnPayload`, ...)
//! - `repository`: the `SessionGateway` trait

mod model;
mod repository;

pub use model::{
    ConversationMode, EditAck, SamplingSettings, SendTurnPayload, SendTurnResponse,
    SessionSnapshot, SessionSummary, SnapshotMessage, TurnMessage, Usage,
};
pub use repository::SessionGateway;
