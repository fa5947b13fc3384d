//! Back-office endpoints (all behind the session gate).

use crate::auth::middleware::AdminSession;
use axum::{response::IntoResponse, Json};

/// GET /api/admin/session - Who the presented token belongs to
pub async fn current_session(AdminSession(identity): AdminSession) -> impl IntoResponse {
    Json(identity)
}
