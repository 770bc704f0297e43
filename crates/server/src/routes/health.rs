use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
