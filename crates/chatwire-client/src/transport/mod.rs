//! Transport layer (the network socket primitive).
//!
//! The channel only ever sees text frames through these traits, so tests can
//! swap the WebSocket implementation for a scripted one.

pub mod ws;

use async_trait::async_trait;

use chatwire_core::error::Result;

pub use ws::{WsConnector, WsTransport};

/// One open, bidirectional text connection.
#[async_trait]
pub trait Transport: Send {
    /// Write one text frame.
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Next inbound text frame. `None` once the peer has closed.
    ///
    /// Must be cancel-safe: the link loop races it against outbound writes.
    async fn recv(&mut self) -> Option<Result<String>>;

    /// Graceful close.
    async fn close(&mut self) -> Result<()>;
}

/// Opens transports to an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, endpoint: &str) -> Result<Box<dyn Transport>>;
}
