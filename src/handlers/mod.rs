pub mod common;
pub mod health;
pub mod items;
pub mod suppliers;

use axum::{response::IntoResponse, Json};
use serde_json::json;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

pub const SERVICE_NAME: &str = "Supplier REST API Service";

/// Root URL: service name and version
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
