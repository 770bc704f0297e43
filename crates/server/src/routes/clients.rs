use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::client::{Client, CreateClient, UpdateClient};
use serde::Deserialize;
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{Path, Query},
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Client>>>, ApiError> {
    let clients = Client::search(state.pool(), query.q.as_deref()).await?;
    Ok(ResponseJson(ApiResponse::success(clients)))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let client = Client::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<CreateClient>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Client>>), ApiError> {
    let Json(payload) = payload?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let client = Client::create(state.pool(), &payload, Uuid::new_v4()).await?;
    info!(client_id = %client.id, "Created client");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(client))))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateClient>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let Json(payload) = payload?;
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::bad_request("name is required"));
    }
    let client = Client::update(state.pool(), id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if Client::delete(state.pool(), id).await? == 0 {
        return Err(ApiError::not_found("Client not found"));
    }
    info!(client_id = %id, "Deleted client");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client).patch(update_client).delete(delete_client),
        )
}
