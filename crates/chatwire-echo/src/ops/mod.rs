//! Status HTTP endpoints.
//!
//! - `/`           : online banner
//! - `/api/health` : liveness

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app_state::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "message": "chatwire echo server is running",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.connection_count(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "echo",
    }))
}
