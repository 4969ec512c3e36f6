//! Axum router wiring (HTTP status endpoints + WS upgrade).

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops::root))
        .route("/api/health", get(ops::health))
        .route("/ws", get(transport::ws::ws_upgrade))
        .with_state(state)
}
