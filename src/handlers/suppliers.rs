use super::common::{
    created_response, json_payload, location_for, map_service_error, no_content_response,
    success_response,
};
use crate::{
    codec::{decode_supplier, encode_supplier},
    errors::{ApiError, EntityKind},
    handlers::AppState,
    models::Supplier,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct SupplierQuery {
    /// Exact-match filter on the supplier name
    pub name: Option<String>,
}

pub(crate) fn supplier_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("Supplier with id '{}' was not found.", id))
}

pub(crate) async fn load_supplier(state: &AppState, id: i32) -> Result<Supplier, ApiError> {
    state
        .store
        .find_by_id::<Supplier>(id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| supplier_not_found(id))
}

/// List suppliers, optionally only those with an exact name
async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SupplierQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = match query.name.as_deref() {
        Some(name) => state.store.find_by_name(name).await,
        None => state.store.all::<Supplier>().await,
    }
    .map_err(map_service_error)?;

    info!("Returning {} suppliers", suppliers.len());
    Ok(success_response(
        suppliers.iter().map(encode_supplier).collect::<Vec<Value>>(),
    ))
}

/// Create a supplier, with any items nested in the payload
async fn create_supplier(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request to create a supplier");
    let payload = json_payload(&headers, &body, EntityKind::Supplier)?;
    let mut supplier = decode_supplier(&payload)?;

    state
        .store
        .create(&mut supplier)
        .await
        .map_err(map_service_error)?;

    let id = supplier.id.unwrap_or_default();
    info!("Supplier with id [{}] created", id);
    let location = location_for(&headers, &format!("/suppliers/{}", id));
    Ok(created_response(encode_supplier(&supplier), Some(location)))
}

/// Get a supplier and its items
async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request for supplier with id: {}", supplier_id);
    let supplier = load_supplier(&state, supplier_id).await?;
    Ok(success_response(encode_supplier(&supplier)))
}

/// Replace a supplier's own fields; its items are left as they are
async fn update_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<i32>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request to update supplier with id: {}", supplier_id);
    let payload = json_payload(&headers, &body, EntityKind::Supplier)?;
    let changes = decode_supplier(&payload)?;
    let mut supplier = load_supplier(&state, supplier_id).await?;

    supplier.name = changes.name;
    supplier.email = changes.email;
    supplier.phone_number = changes.phone_number;
    supplier.date_joined = changes.date_joined;

    state
        .store
        .update(&mut supplier)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(encode_supplier(&supplier)))
}

/// Delete a supplier and, through the cascade, its items
async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request to delete supplier with id: {}", supplier_id);
    let supplier = state
        .store
        .find_by_id::<Supplier>(supplier_id)
        .await
        .map_err(map_service_error)?;

    if let Some(supplier) = supplier {
        state
            .store
            .delete(&supplier)
            .await
            .map_err(map_service_error)?;
    }

    Ok(no_content_response())
}

pub fn supplier_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}
