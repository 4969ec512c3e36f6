//! chatwire echo server
//!
//! - WebSocket endpoint: /ws (echoes every message)
//! - Status: / and /api/health
//! - Config: chatwire-echo.yaml (or the path given as first argument)

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use chatwire_echo::{app_state, config};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "chatwire-echo.yaml".into());
    let cfg = if std::path::Path::new(&path).exists() {
        config::load_from_file(&path).expect("config load failed")
    } else {
        tracing::info!(%path, "config file not found, using defaults");
        config::EchoConfig::default()
    };
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .expect("server.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg);

    tracing::info!(%listen, "chatwire-echo starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    chatwire_echo::serve(listener, state).await.expect("server failed");
}
