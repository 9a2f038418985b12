//! Append-only chat log

use crate::types::ChatMessage;

/// Ordered record of every chat message shown for a call
///
/// Insertion order is display order. There is no removal or in-place edit;
/// the log lives as long as its coordinator.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index
    pub fn append(&mut self, message: ChatMessage) -> usize {
        self.entries.push(message);
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }

    /// Index of the newest entry, for scroll-to-end
    pub fn last_index(&self) -> Option<usize> {
        self.entries.len().checked_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    /// Number of messages authored by the remote party
    pub fn peer_message_count(&self) -> usize {
        self.entries.iter().filter(|m| m.is_from_peer()).count()
    }

    /// Owned copy of the whole log
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.clone()
    }
}
