//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Register the session in the connection registry
//! - Lifecycle: ping on an interval, close on idle timeout, answer pings
//! - Echo every text frame back to its sender

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use chatwire_core::error::{ChatWireError, Result};

use crate::app_state::AppState;
use crate::transport::codec::echo_reply;

fn ws_err(e: axum::Error) -> ChatWireError {
    ChatWireError::Connection(format!("websocket write failed: {e}"))
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let conn = app.open_connection();
        if let Err(e) = run_session(&app, conn, socket).await {
            tracing::debug!(conn, error = %e, "session ended with error");
        }
        app.close_connection(conn);
    })
}

// --------------------
// Session loop
// --------------------
async fn run_session(app: &AppState, conn: u64, socket: WebSocket) -> Result<()> {
    let srv = &app.cfg().server;
    let ping_every = Duration::from_millis(srv.ping_interval_ms);
    let idle_timeout = Duration::from_millis(srv.idle_timeout_ms);

    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut ping_tick = interval_at(Instant::now() + ping_every, ping_every);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };
                last_activity = Instant::now();

                match msg {
                    Message::Text(text) => {
                        let reply = echo_reply(&srv.reply_prefix, &text);
                        tracing::debug!(conn, bytes_len = text.len(), "echo");
                        ws_tx.send(Message::Text(reply)).await.map_err(ws_err)?;
                    }
                    Message::Ping(payload) => {
                        ws_tx.send(Message::Pong(payload)).await.map_err(ws_err)?;
                    }
                    Message::Binary(b) => {
                        tracing::debug!(conn, bytes_len = b.len(), "ignoring binary frame");
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => break,
                }
            }

            _ = ping_tick.tick() => {
                ws_tx.send(Message::Ping(Vec::new())).await.map_err(ws_err)?;
            }

            _ = tokio::time::sleep_until(last_activity + idle_timeout) => {
                tracing::info!(conn, "idle timeout");
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }

    Ok(())
}
