use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use db::DBService;
use services::services::auth::AuthSettings;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utils::response::ApiResponse;

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: Arc<Config>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(db: DBService, config: Config) -> Self {
        let auth = AuthSettings::new(config.jwt_secret.clone(), config.token_ttl_secs);
        Self {
            db,
            config: Arc::new(config),
            auth,
        }
    }

    /// Replace the auth settings, e.g. to lower the hashing cost in tests.
    pub fn with_auth(mut self, auth: AuthSettings) -> Self {
        self.auth = auth;
        self
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.db.pool
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("Not Found")),
    )
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router(&state))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
