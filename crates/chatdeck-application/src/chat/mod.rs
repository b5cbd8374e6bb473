//! Conversation state for the active tab.
//!
//! [`ChatStateCoordinator`] owns the displayed [`ChatView`] and reconciles it
//! with the remote session store. Every asynchronous result is checked
//! against the active tab before it is written; results for other tabs only
//! reach the transition buffer.

mod coordinator;
mod editor;
mod event;
mod send;
mod view;

pub use coordinator::{ChatStateCoordinator, LoadOutcome};
pub use editor::{EditOutcome, HistoryEditSink, MessageEditor};
pub use event::ChatEvent;
pub use send::{ConfirmationOutcome, SendOutcome};
pub use view::ChatView;
