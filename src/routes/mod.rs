//! API route handlers.

pub mod admin;
pub mod auth;

use crate::auth::middleware::{require_admin, AppState};
use axum::{middleware, response::IntoResponse, routing::get, routing::post, Json, Router};

/// GET /api/health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the API router with all endpoints.
///
/// Everything under `/api/admin` sits behind [`require_admin`].
pub fn api_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/admin/session", get(admin::current_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .merge(admin)
        .with_state(state)
}
