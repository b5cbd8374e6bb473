use chatdeck_core::error::{ChatError, Result};
use chatdeck_core::gateway::SessionGateway;
use chatdeck_core::tab::is_sentinel;
use std::sync::Arc;

/// Local side of a message edit: replaces the message content wherever the
/// session's history is held.
pub trait HistoryEditSink: Send + Sync {
    /// Replaces the content of message `index` of `thread_id` and marks it
    /// edited. Returns whether the displayed history was updated.
    fn apply_message_edit(&self, thread_id: &str, index: usize, new_content: &str) -> bool;
}

/// Result of a successful edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub thread_id: String,
    pub index: usize,
    /// Whether the message was shown and has been updated in place.
    pub updated_locally: bool,
}

/// Validates and issues an edit for a single historical message.
///
/// Content is treated as opaque. Callers editing the visible part of an
/// assistant turn with a reasoning section splice it back first
/// (see `chatdeck_core::reasoning::splice_reasoning`).
pub struct MessageEditor {
    gateway: Arc<dyn SessionGateway>,
    sink: Arc<dyn HistoryEditSink>,
}

impl MessageEditor {
    pub fn new(gateway: Arc<dyn SessionGateway>, sink: Arc<dyn HistoryEditSink>) -> Self {
        Self { gateway, sink }
    }

    /// Replaces message `index` of session `thread_id` with `new_content`.
    ///
    /// # Errors
    ///
    /// - `InvalidThread` if `thread_id` is empty or the New Chat id
    /// - `InvalidContent` if `new_content` is empty or whitespace-only
    /// - `InvalidIndex` if `index` is negative
    /// - `Gateway` if the store rejects the edit; local state is untouched
    pub async fn edit(&self, thread_id: &str, index: i64, new_content: &str) -> Result<EditOutcome> {
        let index = Self::validate(thread_id, index, new_content)?;

        tracing::debug!(
            "[MessageEditor] editing thread={} index={} ({} chars)",
            thread_id,
            index,
            new_content.chars().count()
        );

        let ack = match self.gateway.edit_message(thread_id, index, new_content).await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::warn!(
                    "[MessageEditor] edit failed thread={} index={}: {}",
                    thread_id,
                    index,
                    e
                );
                return Err(e);
            }
        };
        if !ack.success {
            return Err(ChatError::gateway("Failed to edit message: not acknowledged"));
        }

        let updated_locally = self.sink.apply_message_edit(thread_id, index, new_content);
        tracing::info!(
            "[MessageEditor] edited thread={} index={} local={}",
            thread_id,
            index,
            updated_locally
        );
        Ok(EditOutcome {
            thread_id: thread_id.to_string(),
            index,
            updated_locally,
        })
    }

    fn validate(thread_id: &str, index: i64, new_content: &str) -> Result<usize> {
        if thread_id.is_empty() || is_sentinel(thread_id) {
            return Err(ChatError::InvalidThread);
        }
        if new_content.trim().is_empty() {
            return Err(ChatError::InvalidContent);
        }
        usize::try_from(index).map_err(|_| ChatError::InvalidIndex(index))
    }
}
