use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, patch},
};
use db::models::receipt::{Receipt, UpdateReceipt};
use services::services::receipts::{CreateReceiptByCode, ReceiptService};
use utils::response::ApiResponse;
use uuid::Uuid;

use super::invoices::CodeQuery;
use crate::{
    AppState,
    error::ApiError,
    extract::{Path, Query},
};

fn service(state: &AppState) -> ReceiptService {
    ReceiptService::new(state.pool().clone())
}

/// GET /api/receipts, optionally narrowed with `?code=`.
pub async fn list_receipts(
    State(state): State<AppState>,
    Query(query): Query<CodeQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Receipt>>>, ApiError> {
    let receipts = service(&state).list(query.code.as_deref()).await?;
    Ok(ResponseJson(ApiResponse::success(receipts)))
}

pub async fn create_receipt(
    State(state): State<AppState>,
    payload: Result<Json<CreateReceiptByCode>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Receipt>>), ApiError> {
    let Json(payload) = payload?;
    let receipt = service(&state).create_by_code(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(receipt))))
}

pub async fn update_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateReceipt>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Receipt>>, ApiError> {
    let Json(payload) = payload?;
    let receipt = service(&state).update(id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(receipt)))
}

pub async fn delete_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    service(&state).delete(id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/receipts", get(list_receipts).post(create_receipt))
        .route("/receipts/{id}", patch(update_receipt).delete(delete_receipt))
}
