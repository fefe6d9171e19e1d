//! The caller's own registrations

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::Response;

use super::{forward, ApiError};
use crate::middleware::{BearerToken, Lang};
use crate::state::AppContext;

/// GET /api/my-activities - 400 when the token carries no subject
pub async fn my_activities(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
) -> Result<Response, ApiError> {
    if ctx.services.auth_service.principal(&token).is_none() {
        return Err(ApiError::message(
            &ctx,
            &lang,
            StatusCode::BAD_REQUEST,
            "errors.missing_subject",
            None,
        ));
    }

    forward(
        &ctx,
        &lang,
        &token,
        Method::GET,
        "/activity-registrations/my-activities",
        &[],
        None,
    )
    .await
}

/// GET /api/my-events
pub async fn my_events(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
) -> Result<Response, ApiError> {
    forward(
        &ctx,
        &lang,
        &token,
        Method::GET,
        "/event-registrations/my-events",
        &[],
        None,
    )
    .await
}
