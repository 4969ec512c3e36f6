//! WebSocket transport (tokio-tungstenite).
//!
//! - Text frames are surfaced as-is
//! - Binary frames are ignored (the wire format is JSON text)
//! - Ping/Pong are answered by tungstenite itself
//! - Close frames end the stream

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::debug;

use chatwire_core::error::{ChatWireError, Result};

use super::{Connector, Transport};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector for `ws://` / `wss://` endpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, endpoint: &str) -> Result<Box<dyn Transport>> {
        let (stream, response) = connect_async(endpoint)
            .await
            .map_err(|e| ChatWireError::Connection(format!("websocket connect failed: {e}")))?;
        debug!(%endpoint, status = %response.status(), "websocket handshake complete");
        Ok(Box::new(WsTransport { stream }))
    }
}

pub struct WsTransport {
    stream: WsStream,
}

fn io_err(what: &str, e: WsError) -> ChatWireError {
    ChatWireError::Connection(format!("websocket {what} failed: {e}"))
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| io_err("write", e))
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "websocket closed by server");
                    return None;
                }
                Ok(Message::Binary(b)) => {
                    debug!(bytes_len = b.len(), "ignoring binary frame");
                }
                Ok(_) => {}
                Err(WsError::ConnectionClosed) => return None,
                Err(e) => return Some(Err(io_err("read", e))),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(io_err("close", e)),
        }
    }
}
