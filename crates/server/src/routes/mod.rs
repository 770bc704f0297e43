use axum::Router;

use crate::AppState;

pub mod auth;
pub mod clients;
pub mod handovers;
pub mod health;
pub mod invoices;
pub mod products;
pub mod receipts;
pub mod staff;

pub fn router(state: &AppState) -> Router<AppState> {
    let api = Router::new()
        .merge(clients::router(state))
        .merge(staff::router(state))
        .merge(products::router(state))
        .merge(invoices::router(state))
        .merge(receipts::router(state))
        .merge(handovers::router(state))
        .nest("/auth", auth::router(state));

    Router::new()
        .merge(health::router(state))
        .nest("/api", api)
}
