//! Caller identity and liveness

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::middleware::CurrentUser;
use crate::models::Principal;
use crate::services::ServiceHealthStatus;
use crate::state::AppContext;

/// GET /api/me - the principal decoded from the caller's token
pub async fn me(user: CurrentUser) -> Json<Principal> {
    Json(user.auth.principal)
}

/// GET /api/health
pub async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<ServiceHealthStatus>) {
    let status = ctx.services.health_check();
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
