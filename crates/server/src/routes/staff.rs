use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::staff::{CreateStaff, Staff, UpdateStaff};
use services::services::staff::StaffService;
use utils::response::ApiResponse;
use uuid::Uuid;

use super::clients::SearchQuery;
use crate::{
    AppState,
    error::ApiError,
    extract::{Path, Query},
};

fn service(state: &AppState) -> StaffService {
    StaffService::new(state.pool().clone())
}

pub async fn list_staff(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Staff>>>, ApiError> {
    let staff = service(&state).search(query.q.as_deref()).await?;
    Ok(ResponseJson(ApiResponse::success(staff)))
}

pub async fn get_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Staff>>, ApiError> {
    let staff = service(&state).get(id).await?;
    Ok(ResponseJson(ApiResponse::success(staff)))
}

pub async fn create_staff(
    State(state): State<AppState>,
    payload: Result<Json<CreateStaff>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Staff>>), ApiError> {
    let Json(payload) = payload?;
    let staff = service(&state).create(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(staff))))
}

pub async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateStaff>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Staff>>, ApiError> {
    let Json(payload) = payload?;
    let staff = service(&state).update(id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(staff)))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    service(&state).delete(id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/staff", get(list_staff).post(create_staff))
        .route(
            "/staff/{id}",
            get(get_staff).patch(update_staff).delete(delete_staff),
        )
}
