use super::common::{
    created_response, json_payload, location_for, map_service_error, no_content_response,
    success_response,
};
use super::suppliers::load_supplier;
use crate::{
    codec::{decode_item, encode_item},
    errors::{ApiError, EntityKind, ServiceError},
    handlers::AppState,
    models::Item,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

fn item_not_found(supplier_id: i32, item_id: i32) -> ApiError {
    ApiError::NotFound(format!(
        "Item with id '{}' was not found for supplier '{}'.",
        item_id, supplier_id
    ))
}

/// The item, provided it exists and is owned by `supplier_id`
async fn find_owned_item(
    state: &AppState,
    supplier_id: i32,
    item_id: i32,
) -> Result<Option<Item>, ApiError> {
    let item = state
        .store
        .find_by_id::<Item>(item_id)
        .await
        .map_err(map_service_error)?;
    Ok(item.filter(|item| item.supplier_id == Some(supplier_id)))
}

/// List the items a supplier stocks
async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = load_supplier(&state, supplier_id).await?;
    Ok(success_response(
        supplier.items.iter().map(encode_item).collect::<Vec<Value>>(),
    ))
}

/// Append an item to a supplier
async fn create_item(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<i32>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request to add an item to supplier {}", supplier_id);
    let payload = json_payload(&headers, &body, EntityKind::Item)?;
    load_supplier(&state, supplier_id).await?;
    let mut item = decode_item(&payload)?;

    item.supplier_id = Some(supplier_id);
    state
        .store
        .create(&mut item)
        .await
        .map_err(map_service_error)?;

    let item_id = item.id.ok_or_else(|| {
        ServiceError::InternalError("created item has no id".to_string())
    })?;
    info!("Item with id [{}] added to supplier {}", item_id, supplier_id);

    let location = location_for(
        &headers,
        &format!("/suppliers/{}/items/{}", supplier_id, item_id),
    );
    Ok(created_response(encode_item(&item), Some(location)))
}

/// Get one of a supplier's items
async fn get_item(
    State(state): State<Arc<AppState>>,
    Path((supplier_id, item_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request for item {} of supplier {}", item_id, supplier_id);
    let item = find_owned_item(&state, supplier_id, item_id)
        .await?
        .ok_or_else(|| item_not_found(supplier_id, item_id))?;
    Ok(success_response(encode_item(&item)))
}

/// Replace an item's fields; it stays with the supplier in the path
async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((supplier_id, item_id)): Path<(i32, i32)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request to update item {} of supplier {}", item_id, supplier_id);
    let payload = json_payload(&headers, &body, EntityKind::Item)?;
    let changes = decode_item(&payload)?;
    let mut item = find_owned_item(&state, supplier_id, item_id)
        .await?
        .ok_or_else(|| item_not_found(supplier_id, item_id))?;

    item.sku = changes.sku;
    item.name = changes.name;
    item.quantity = changes.quantity;
    item.price = changes.price;

    state
        .store
        .update(&mut item)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(encode_item(&item)))
}

/// Delete one of a supplier's items
async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path((supplier_id, item_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request to delete item {} of supplier {}", item_id, supplier_id);
    if let Some(item) = find_owned_item(&state, supplier_id, item_id).await? {
        state
            .store
            .delete(&item)
            .await
            .map_err(map_service_error)?;
    }
    Ok(no_content_response())
}

pub fn item_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id/items", get(list_items).post(create_item))
        .route(
            "/:id/items/:item_id",
            get(get_item).put(update_item).delete(delete_item),
        )
}
