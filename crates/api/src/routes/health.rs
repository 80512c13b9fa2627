use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Reports which content backend is wired and how many live listeners exist.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "contentBackend": state.content().backend_tag(),
        "subscribers": state.event_bus().subscriber_count(),
    }))
}

/// Lightweight ping.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
