//! Shared application state for the echo server.
//!
//! Holds the validated config and the registry of live WebSocket sessions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use crate::config::EchoConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: EchoConfig,
    connections: DashMap<u64, Instant>,
    next_conn: AtomicU64,
}

impl AppState {
    pub fn new(cfg: EchoConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                connections: DashMap::new(),
                next_conn: AtomicU64::new(1),
            }),
        }
    }

    pub fn cfg(&self) -> &EchoConfig {
        &self.inner.cfg
    }

    /// Register a session; returns its id.
    pub fn open_connection(&self) -> u64 {
        let id = self.inner.next_conn.fetch_add(1, Ordering::Relaxed);
        self.inner.connections.insert(id, Instant::now());
        tracing::info!(conn = id, total = self.inner.connections.len(), "websocket client connected");
        id
    }

    pub fn close_connection(&self, id: u64) {
        if let Some((_, opened)) = self.inner.connections.remove(&id) {
            tracing::info!(
                conn = id,
                total = self.inner.connections.len(),
                lived_ms = opened.elapsed().as_millis() as u64,
                "websocket client disconnected"
            );
        }
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }
}
