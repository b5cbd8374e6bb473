//! Capability traits the tab registry uses to hand directives to the chat
//! state coordinator.
//!
//! The registry owns the active-tab pointer and the coordinator owns the
//! displayed conversation. Each side only sees the other through a narrow
//! interface, injected at construction, so neither needs the other's
//! concrete type.

/// Receives "clear to new-chat defaults" directives.
pub trait ClearRequester: Send + Sync {
    /// Resets the displayed conversation for the New Chat tab.
    fn request_clear(&self);
}

/// Receives "load session" directives.
pub trait SessionLoadRequester: Send + Sync {
    /// Starts loading `thread_id` for display. Must return without waiting
    /// for the network.
    fn request_session_load(&self, thread_id: &str);
}
