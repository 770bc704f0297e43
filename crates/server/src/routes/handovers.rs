use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::handover::{CreateHandoverLetter, HandoverLetter, UpdateHandoverLetter};
use services::services::handovers::HandoverService;
use utils::{response::ApiResponse, text::decode_code};
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::Path};

fn service(state: &AppState) -> HandoverService {
    HandoverService::new(state.pool().clone())
}

/// GET /api/handovers/by-code/FOLKS/INV/08/001, raw slashes allowed.
pub async fn list_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<HandoverLetter>>>, ApiError> {
    let letters = service(&state).list_by_code(&decode_code(&code)).await?;
    Ok(ResponseJson(ApiResponse::success(letters)))
}

pub async fn get_handover(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<HandoverLetter>>, ApiError> {
    let letter = service(&state).get(id).await?;
    Ok(ResponseJson(ApiResponse::success(letter)))
}

pub async fn create_handover(
    State(state): State<AppState>,
    payload: Result<Json<CreateHandoverLetter>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<HandoverLetter>>), ApiError> {
    let Json(payload) = payload?;
    let letter = service(&state).create(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(letter))))
}

pub async fn update_handover(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateHandoverLetter>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<HandoverLetter>>, ApiError> {
    let Json(payload) = payload?;
    let letter = service(&state).update(id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(letter)))
}

pub async fn delete_handover(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    service(&state).delete(id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/handovers", post(create_handover))
        .route("/handovers/by-code/{*code}", get(list_by_code))
        .route(
            "/handovers/{id}",
            get(get_handover)
                .patch(update_handover)
                .delete(delete_handover),
        )
}
