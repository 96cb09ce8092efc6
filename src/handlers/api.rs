use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

pub const SERVICE_BANNER: &str = "Calldove translation gateway is running";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
    pub websocket_connections: usize,
    pub pending_calls: u64,
}

pub async fn root() -> &'static str {
    SERVICE_BANNER
}

/// Liveness plus a snapshot of relay load.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_sessions: state.active_session_count(),
        websocket_connections: state.ws_connection_count(),
        pending_calls: state.call_registry.pending_calls(),
    })
}
