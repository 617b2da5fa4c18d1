use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use till::{
    catalog::{NewProduct, Product, ProductPatch},
    table::{Slug, Table, TableInput, TableUpdate},
};
use tracing::info;

use crate::{error::AppError, state::State, utils::parse_id};

type AppState = AxumState<Arc<State>>;

pub async fn health_handler(AxumState(state): AppState) -> impl IntoResponse {
    let orders = state.orders.read().await.len();

    Json(json!({ "status": "ok", "orders": orders }))
}

#[derive(Deserialize)]
pub struct ProductsQuery {
    #[serde(default)]
    all: bool,
}

pub async fn list_products_handler(
    AxumState(state): AppState,
    Query(query): Query<ProductsQuery>,
) -> Json<Vec<Product>> {
    Json(state.catalog.read().await.list(query.all))
}

pub async fn create_product_handler(
    AxumState(state): AppState,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.catalog.write().await.create(payload)?;
    info!("Created product {} ({})", product.id, product.name);

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;

    Ok(Json(state.catalog.read().await.get(id)?))
}

pub async fn patch_product_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;
    let product = state.catalog.write().await.patch(id, patch)?;
    info!("Updated product {id}");

    Ok(Json(product))
}

pub async fn delete_product_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.catalog.write().await.remove(id)?;
    info!("Removed product {id}");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_product_handler(
    AxumState(state): AppState,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;
    let product = state.catalog.write().await.reset(id)?;
    info!("Reset product {id} to catalog defaults");

    Ok(Json(product))
}

pub async fn list_tables_handler(AxumState(state): AppState) -> Json<Vec<Table>> {
    Json(state.tables.read().await.list())
}

pub async fn upsert_table_handler(
    AxumState(state): AppState,
    Json(payload): Json<TableInput>,
) -> Result<impl IntoResponse, AppError> {
    let (table, created) = state.tables.write().await.upsert(payload)?;
    info!("Saved table {}", table.slug);

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(table)))
}

pub async fn get_table_handler(
    AxumState(state): AppState,
    Path(slug): Path<String>,
) -> Result<Json<Table>, AppError> {
    Ok(Json(state.tables.read().await.get(&slug)?.clone()))
}

pub async fn update_table_handler(
    AxumState(state): AppState,
    Path(slug): Path<String>,
    Json(update): Json<TableUpdate>,
) -> Result<Json<Table>, AppError> {
    Ok(Json(state.tables.write().await.update(&slug, update)?))
}

pub async fn delete_table_handler(
    AxumState(state): AppState,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    let table = state.tables.write().await.remove(&slug)?;
    info!("Removed table {}", table.slug);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn slug_handler(Path(slug): Path<String>) -> Result<Json<Slug>, AppError> {
    Ok(Json(Slug::parse(&slug)?))
}

pub async fn takeaway_handler(AxumState(state): AppState) -> impl IntoResponse {
    let slot = state.takeaway.lock().await.next_slot();
    info!("Allocated {}", slot.slug);

    (StatusCode::CREATED, Json(slot))
}
