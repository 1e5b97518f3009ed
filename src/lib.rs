//! Supplier service library
//!
//! A REST resource service for suppliers and the items they stock, backed by
//! a relational store through sea-orm.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod codec;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod tracing;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::repositories::EntityStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub store: EntityStore,
    pub config: config::AppConfig,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        Self {
            store: EntityStore::new(db.clone()),
            db,
            config,
        }
    }
}

/// Full HTTP surface: index, health, suppliers and their items
pub fn app_router(state: Arc<AppState>) -> Router {
    let suppliers = handlers::suppliers::supplier_routes().merge(handlers::items::item_routes());

    Router::new()
        .route("/", get(handlers::index))
        .merge(handlers::health::health_routes())
        .nest("/suppliers", suppliers)
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
