//! Message store: append-only ordered log of chat turns.
//!
//! The realtime channel never reads the store; the UI layer appends to it
//! and renders from it.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::{Conversation, Message};

/// Store consumed by the UI layer.
pub trait MessageStore: Send + Sync {
    fn append(&self, msg: Message);
    /// Messages in insertion order.
    fn list(&self) -> Vec<Message>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn clear(&self);
}

/// In-process store backed by one `Conversation`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    conv: RwLock<Conversation>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversation(conv: Conversation) -> Self {
        Self {
            conv: RwLock::new(conv),
        }
    }

    /// Copy of the whole conversation (metadata + messages).
    pub fn snapshot(&self) -> Conversation {
        self.read().clone()
    }

    // Poisoned lock means a listener panicked mid-append; the data is still a
    // valid prefix, so keep serving it.
    fn read(&self) -> RwLockReadGuard<'_, Conversation> {
        self.conv.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Conversation> {
        self.conv.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl MessageStore for InMemoryStore {
    fn append(&self, msg: Message) {
        self.write().push(msg);
    }

    fn list(&self) -> Vec<Message> {
        self.read().messages.clone()
    }

    fn len(&self) -> usize {
        self.read().messages.len()
    }

    fn clear(&self) {
        let mut conv = self.write();
        tracing::debug!(conversation = %conv.id, dropped = conv.messages.len(), "conversation cleared");
        conv.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    #[test]
    fn keeps_insertion_order() {
        let store = InMemoryStore::new();
        store.append(Message::user("one"));
        store.append(Message::assistant("two"));
        store.append(Message::user("three"));

        let got: Vec<_> = store.list().into_iter().map(|m| (m.role, m.content)).collect();
        assert_eq!(
            got,
            vec![
                (Role::User, "one".to_string()),
                (Role::Assistant, "two".to_string()),
                (Role::User, "three".to_string()),
            ]
        );
    }

    #[test]
    fn clear_empties_but_keeps_conversation() {
        let store = InMemoryStore::new();
        let id = store.snapshot().id;
        store.append(Message::user("x"));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.snapshot().id, id);
    }
}
