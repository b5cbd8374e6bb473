//! Application layer for chatdeck.
//!
//! This crate coordinates the open tabs, the conversation displayed for the
//! active tab, and the remote session store.

pub mod chat;
pub mod confirmation;
mod sync;
pub mod tabs;
pub mod transition_buffer;

pub use chat::{
    ChatEvent, ChatStateCoordinator, ChatView, ConfirmationOutcome, EditOutcome, HistoryEditSink,
    LoadOutcome, MessageEditor, SendOutcome,
};
pub use confirmation::ConfirmationPolicy;
pub use tabs::{TabDirective, TabRegistry, TabSnapshot};
pub use transition_buffer::TransitionBuffer;
