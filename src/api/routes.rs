use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::handlers::{
    add_account, apply_filters, get_filters, get_metrics, health_check, list_accounts, list_sites,
    refresh, remove_account, reset_filters, update_draft, AppState,
};

pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/sites", get(list_sites))
        .route("/api/metrics", get(get_metrics))
        .route("/api/refresh", post(refresh))
        .route("/api/filters", get(get_filters))
        .route("/api/filters/draft", put(update_draft))
        .route("/api/filters/apply", post(apply_filters))
        .route("/api/filters/reset", post(reset_filters))
        .route("/api/accounts", get(list_accounts))
        .route("/api/accounts", post(add_account))
        .route("/api/accounts/{email}", delete(remove_account))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
