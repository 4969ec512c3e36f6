//! Chat data model: messages and conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a freshly created conversation.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Chat";

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One chat turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Backend that produced an assistant turn, when the server says so.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            provider: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Ordered sequence of messages plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Append a message; existing entries are never touched.
    pub fn push(&mut self, msg: Message) {
        self.updated_at = Utc::now();
        self.messages.push(msg);
    }

    pub fn clear(&mut self) {
        self.updated_at = Utc::now();
        self.messages.clear();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERSATION_TITLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let m = Message::assistant("hello").with_provider("groq");
        let v = serde_json::to_value(&m).unwrap_or_default();
        assert_eq!(v["role"], "assistant");
        assert_eq!(v["provider"], "groq");
    }

    #[test]
    fn push_bumps_updated_at() {
        let mut c = Conversation::default();
        let created = c.created_at;
        c.push(Message::user("hi"));
        assert_eq!(c.title, DEFAULT_CONVERSATION_TITLE);
        assert_eq!(c.messages.len(), 1);
        assert!(c.updated_at >= created);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Message::user("a").id, Message::user("a").id);
    }
}
