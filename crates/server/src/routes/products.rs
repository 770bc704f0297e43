use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::product::{Product, ProductPayload, ProductSearch};
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{Path, Query},
};

const NOT_FOUND: &str = "Product not found";

fn check_price(price: Option<i64>) -> Result<(), ApiError> {
    match price {
        Some(p) if p < 0 => Err(ApiError::bad_request("unitPrice must be >= 0")),
        _ => Ok(()),
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductSearch>,
) -> Result<ResponseJson<ApiResponse<Vec<Product>>>, ApiError> {
    let products = Product::search(state.pool(), &filter).await?;
    Ok(ResponseJson(ApiResponse::success(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Product>>, ApiError> {
    let product = Product::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(ResponseJson(ApiResponse::success(product)))
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Product>>), ApiError> {
    let Json(payload) = payload?;
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("name and unitPrice are required"))?;
    let unit_price = payload
        .unit_price
        .ok_or_else(|| ApiError::bad_request("name and unitPrice are required"))?;
    check_price(Some(unit_price))?;

    let product = Product::create(state.pool(), Uuid::new_v4(), name, unit_price, &payload).await?;
    info!(product_id = %product.id, "Created product");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(product))))
}

/// Partial update, served for both PATCH and PUT.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Product>>, ApiError> {
    let Json(payload) = payload?;
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::bad_request("name is required"));
    }
    check_price(payload.unit_price)?;

    let product = Product::update(state.pool(), id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(ResponseJson(ApiResponse::success(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Product>>, ApiError> {
    let product = Product::delete(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    info!(product_id = %id, "Deleted product");
    Ok(ResponseJson(ApiResponse::success(product)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product)
                .patch(update_product)
                .put(update_product)
                .delete(delete_product),
        )
}
