//! Health check handler.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Health check.
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "server": state.config.server_name,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.uptime_seconds(),
    }))
}
