use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::{
    handover::HandoverLetter,
    invoice::{CreateInvoice, CreatedInvoice, InvoiceSearch, InvoiceSummary, UpdateInvoiceHeader},
    invoice_item::{CreateInvoiceItem, InvoiceItem},
    receipt::{CreateReceipt, Receipt},
};
use serde::Deserialize;
use services::services::{
    handovers::HandoverService,
    invoices::{InvoiceDetail, InvoiceService},
    receipts::ReceiptService,
};
use utils::{response::ApiResponse, text::decode_code};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{Path, Query},
};

fn service(state: &AppState) -> InvoiceService {
    InvoiceService::new(state.pool().clone())
}

#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    pub code: Option<String>,
}

pub async fn search_invoices(
    State(state): State<AppState>,
    Query(filter): Query<InvoiceSearch>,
) -> Result<ResponseJson<ApiResponse<Vec<InvoiceSummary>>>, ApiError> {
    let invoices = service(&state).search(&filter).await?;
    Ok(ResponseJson(ApiResponse::success(invoices)))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    payload: Result<Json<CreateInvoice>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<CreatedInvoice>>), ApiError> {
    let Json(payload) = payload?;
    let created = service(&state).create(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(created))))
}

pub async fn create_empty_invoice(
    State(state): State<AppState>,
    payload: Result<Json<CreateInvoice>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<CreatedInvoice>>), ApiError> {
    let Json(payload) = payload?;
    let created = service(&state).create_empty(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(created))))
}

/// GET /api/invoice?code=FOLKS/INV/08/001
pub async fn get_invoice_by_query(
    State(state): State<AppState>,
    Query(query): Query<CodeQuery>,
) -> Result<ResponseJson<ApiResponse<InvoiceDetail>>, ApiError> {
    let code = query
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("code is required"))?;
    let detail = service(&state).detail(code).await?;
    Ok(ResponseJson(ApiResponse::success(detail)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ResponseJson<ApiResponse<InvoiceDetail>>, ApiError> {
    let detail = service(&state).detail(&decode_code(&code)).await?;
    Ok(ResponseJson(ApiResponse::success(detail)))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(code): Path<String>,
    payload: Result<Json<UpdateInvoiceHeader>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<InvoiceDetail>>, ApiError> {
    let Json(payload) = payload?;
    let detail = service(&state)
        .update_header(&decode_code(&code), &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(detail)))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    service(&state).delete(&decode_code(&code)).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<InvoiceItem>>>, ApiError> {
    let items = service(&state).items_by_code(&decode_code(&code)).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    payload: Result<Json<CreateInvoiceItem>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<InvoiceItem>>), ApiError> {
    let Json(payload) = payload?;
    let item = service(&state).add_item(invoice_id, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(item))))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    service(&state).delete_item(item_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn list_receipts(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<Receipt>>>, ApiError> {
    let receipts = ReceiptService::new(state.pool().clone())
        .list(Some(&decode_code(&code)))
        .await?;
    Ok(ResponseJson(ApiResponse::success(receipts)))
}

pub async fn add_receipt(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    payload: Result<Json<CreateReceipt>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Receipt>>), ApiError> {
    let Json(payload) = payload?;
    let receipt = ReceiptService::new(state.pool().clone())
        .create_for_invoice(invoice_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(receipt))))
}

pub async fn list_handovers(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<HandoverLetter>>>, ApiError> {
    let letters = HandoverService::new(state.pool().clone())
        .list_by_code(&decode_code(&code))
        .await?;
    Ok(ResponseJson(ApiResponse::success(letters)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    // GET routes take an invoice code, POST routes on the same path an invoice id.
    Router::new()
        .route("/invoices", get(search_invoices).post(create_invoice))
        .route("/invoices/empty", post(create_empty_invoice))
        .route("/invoice", get(get_invoice_by_query))
        .route(
            "/invoices/{code}",
            get(get_invoice).patch(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{code}/items", get(list_items).post(add_item))
        .route(
            "/invoices/{code}/receipts",
            get(list_receipts).post(add_receipt),
        )
        .route("/invoices/{code}/handovers", get(list_handovers))
        .route("/items/{id}", delete(delete_item))
}
