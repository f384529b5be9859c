use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Registered connections, joined or not.
    pub connections: usize,
    /// Joined members.
    pub members: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.relay.registry();
    Json(HealthResponse {
        status: "ok",
        connections: registry.len(),
        members: registry.active_count(),
    })
}
