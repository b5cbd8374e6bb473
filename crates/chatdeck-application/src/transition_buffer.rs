use crate::sync::lock;
use chatdeck_core::TransitionRecord;
use std::collections::HashMap;
use std::sync::Mutex;

/// Short-lived cache of the latest known `{history, settings}` per session.
///
/// Bridges the gap between "a session id became known" and "the store
/// serves a consistent view of it". Reads are destructive: the first `take`
/// for an id wins and later ones see nothing. A later `put` for an id
/// replaces the earlier one.
///
/// Access is synchronous so a record can be consumed without suspending.
#[derive(Debug, Default)]
pub struct TransitionBuffer {
    records: Mutex<HashMap<String, TransitionRecord>>,
}

impl TransitionBuffer {
    /// Creates a new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` under its thread id, replacing any previous record.
    pub fn put(&self, record: TransitionRecord) {
        let mut records = lock(&self.records);
        tracing::debug!(
            "[TransitionBuffer] put thread_id={} turns={}",
            record.thread_id,
            record.history.len()
        );
        records.insert(record.thread_id.clone(), record);
    }

    /// Removes and returns the record for `thread_id`.
    pub fn take(&self, thread_id: &str) -> Option<TransitionRecord> {
        let record = lock(&self.records).remove(thread_id);
        if record.is_some() {
            tracing::debug!("[TransitionBuffer] took thread_id={}", thread_id);
        }
        record
    }

    /// Applies `f` to the record for `thread_id`, if there is one.
    ///
    /// Returns whether a record was updated.
    pub fn update<F>(&self, thread_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut TransitionRecord),
    {
        match lock(&self.records).get_mut(thread_id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Number of turns held for `thread_id`, without consuming the record.
    pub fn turns(&self, thread_id: &str) -> Option<usize> {
        lock(&self.records)
            .get(thread_id)
            .map(|record| record.history.len())
    }

    pub fn contains(&self, thread_id: &str) -> bool {
        lock(&self.records).contains_key(thread_id)
    }

    /// Drops the record for `thread_id`.
    pub fn remove(&self, thread_id: &str) {
        lock(&self.records).remove(thread_id);
    }

    /// Drops every record.
    pub fn clear(&self) {
        lock(&self.records).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
