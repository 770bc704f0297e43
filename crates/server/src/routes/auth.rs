use axum::{
    Json, Router,
    extract::{FromRequestParts, State, rejection::JsonRejection},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use services::services::auth::{
    AuthError, AuthService, AuthSession, Claims, LoginRequest, RegisterRequest,
};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

fn service(state: &AppState) -> AuthService {
    AuthService::new(state.pool().clone(), state.auth.clone())
}

/// Token of a `Bearer` credential. The scheme name is case-insensitive (RFC 7235).
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Claims of a valid `Authorization: Bearer` token.
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::InvalidToken)?;
        let claims = service(state).verify_token(token)?;
        Ok(AuthUser(claims))
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserRequest {
    pub email: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<AuthSession>>), ApiError> {
    let Json(payload) = payload?;
    let session = service(&state).register(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(session))))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<AuthSession>>, ApiError> {
    let Json(payload) = payload?;
    let session = service(&state).login(&payload).await?;
    Ok(ResponseJson(ApiResponse::success(session)))
}

/// Tokens are stateless; the client drops its copy.
pub async fn logout() -> ResponseJson<ApiResponse<LogoutResponse>> {
    ResponseJson(ApiResponse::success(LogoutResponse {
        ok: true,
        message: "Logged out".to_string(),
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    payload: Result<Json<DeleteUserRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let Json(payload) = payload?;
    service(&state).delete_user(payload.email.as_deref()).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn me(AuthUser(claims): AuthUser) -> ResponseJson<ApiResponse<Claims>> {
    ResponseJson(ApiResponse::success(claims))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/user", delete(delete_user))
        .route("/me", get(me))
}
