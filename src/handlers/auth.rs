//! Authentication handlers: login, logout and self-service registration

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::info;

use super::{ApiError, Localize};
use crate::i18n::TranslationParams;
use crate::middleware::auth::{clear_session_cookie, session_cookie};
use crate::middleware::Lang;
use crate::models::{LoginRequest, RegisterUserRequest};
use crate::state::AppContext;
use crate::utils::errors::EventusError;
use crate::utils::logging::log_user_action;

fn with_cookie(mut response: Response, cookie: cookie::Cookie<'static>) -> Response {
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// POST /api/auth/login - password grant; the token is also set as the session cookie
pub async fn login(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    Json(credentials): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let token = ctx
        .services
        .identity
        .login(&credentials.username, &credentials.password)
        .await
        .map_err(EventusError::from)
        .localized(&ctx, &lang)?;

    log_user_action(&credentials.username, "login", None);

    let cookie = session_cookie(
        &ctx.settings.session.cookie_name,
        &token.access_token,
        token.expires_in,
    );
    Ok(with_cookie(Json(token).into_response(), cookie))
}

/// POST /api/auth/logout - clears the session cookie
pub async fn logout(State(ctx): State<AppContext>, Lang(lang): Lang) -> Response {
    let body = Json(json!({ "message": ctx.i18n.t("auth.logged_out", &lang, None) }));
    with_cookie(
        body.into_response(),
        clear_session_cookie(&ctx.settings.session.cookie_name),
    )
}

/// POST /api/auth/register - create a user with one of the application roles
pub async fn register(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    Json(request): Json<RegisterUserRequest>,
) -> Result<Response, ApiError> {
    let missing = request.missing_fields();
    if !missing.is_empty() {
        let params = TranslationParams::from([("fields".to_string(), missing.join(", "))]);
        return Err(ApiError::message(
            &ctx,
            &lang,
            StatusCode::BAD_REQUEST,
            "auth.missing_fields",
            Some(&params),
        ));
    }

    let user_id = ctx
        .services
        .identity
        .register_user(&request)
        .await
        .localized(&ctx, &lang)?;

    info!(username = %request.username, role = %request.role, "Self-service registration completed");
    let body = json!({
        "message": ctx.i18n.t("auth.registered", &lang, None),
        "userId": user_id,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}
