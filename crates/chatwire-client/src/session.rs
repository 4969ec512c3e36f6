//! Chat session: glue between the realtime channel and the message store.
//!
//! User text goes out through the channel and lands in the store once it has
//! been handed to the transport; every inbound payload becomes an assistant
//! turn.

use std::sync::Arc;

use chatwire_core::error::Result;
use chatwire_core::model::Message;
use chatwire_core::protocol::WirePayload;
use chatwire_core::store::MessageStore;

use crate::channel::{ListenerId, RealtimeChannel};

/// Inbound field naming the backend that produced a reply.
pub const PROVIDER_FIELD: &str = "provider";

pub struct ChatSession {
    channel: RealtimeChannel,
    store: Arc<dyn MessageStore>,
    listener: ListenerId,
}

impl ChatSession {
    pub fn new(channel: RealtimeChannel, store: Arc<dyn MessageStore>) -> Self {
        let sink = Arc::clone(&store);
        let listener = channel.on_message(move |payload: &WirePayload| {
            sink.append(assistant_turn(payload));
        });
        Self {
            channel,
            store,
            listener,
        }
    }

    pub fn channel(&self) -> &RealtimeChannel {
        &self.channel
    }

    /// Send user text. Blank input is ignored (`Ok(None)`).
    ///
    /// The user turn is recorded only when the send succeeded; errors such as
    /// `NotConnected` are returned unchanged for the UI to show.
    pub fn submit(&self, text: &str) -> Result<Option<Message>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.channel.send(&WirePayload::new(text))?;

        let msg = Message::user(text);
        self.store.append(msg.clone());
        Ok(Some(msg))
    }

    pub fn history(&self) -> Vec<Message> {
        self.store.list()
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.channel.remove_listener(self.listener);
    }
}

fn assistant_turn(payload: &WirePayload) -> Message {
    let msg = Message::assistant(payload.message.clone());
    match payload.field_str(PROVIDER_FIELD) {
        Some(provider) => msg.with_provider(provider),
        None => msg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatwire_core::model::Role;

    #[test]
    fn reply_carries_provider() {
        let p = WirePayload::new("hello").with_field(PROVIDER_FIELD, "groq");
        let m = assistant_turn(&p);
        assert_eq!(m.role, Role::Assistant);
        assert_eq!(m.content, "hello");
        assert_eq!(m.provider.as_deref(), Some("groq"));
    }

    #[test]
    fn reply_without_provider() {
        let m = assistant_turn(&WirePayload::new("hello"));
        assert!(m.provider.is_none());
    }
}
