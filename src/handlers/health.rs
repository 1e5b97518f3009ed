use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::handlers::AppState;

/// Answers 200 while the database responds to a ping, 503 otherwise
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let start = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match db_result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "up",
                "checks": {
                    "database": { "status": "up", "latency_ms": latency_ms }
                },
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "down",
                "checks": {
                    "database": { "status": "down", "error": e.response_message() }
                },
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        ),
    }
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
