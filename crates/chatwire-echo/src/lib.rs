//! chatwire echo server library entry.
//!
//! A development stand-in for the chat backend: it accepts WebSocket clients
//! on `/ws` and echoes every message back. It is consumed by the binary
//! (`main.rs`) and by the client's end-to-end tests.

pub mod app_state;
pub mod config;
pub mod ops;
pub mod router;
pub mod transport;

use tokio::net::TcpListener;

/// Serve `state` on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: app_state::AppState) -> std::io::Result<()> {
    axum::serve(listener, router::build_router(state)).await
}
