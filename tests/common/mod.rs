#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use supplier_service::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    repositories::EntityStore,
    AppState,
};
use tower::ServiceExt;

/// Helper harness for spinning up the application against an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_cfg = DbConfig::in_memory_sqlite();
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let mut cfg = AppConfig::new(
            db_cfg.url.clone(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;

        let state = Arc::new(AppState::new(Arc::new(pool), cfg));
        let router = app_router(state.clone());

        Self { router, state }
    }

    pub fn store(&self) -> &EntityStore {
        &self.state.store
    }

    /// Sends a request; a JSON body is tagged `application/json`.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "localhost");

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Sends a raw body with caller-chosen headers
    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: &str,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// A valid supplier payload without items
pub fn supplier_payload(name: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "phone_number": "555-0100",
        "date_joined": "2024-01-05"
    })
}

/// A valid item payload that links to whichever supplier it is attached to
pub fn item_payload(sku: &str) -> Value {
    json!({
        "supplier_id": null,
        "sku": sku,
        "name": "Hat",
        "quantity": 10,
        "price": "12.50"
    })
}
