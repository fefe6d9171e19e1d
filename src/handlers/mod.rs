//! HTTP handlers module
//!
//! This module contains the `/api` surface organized by resource:
//! - Proxy routes that relay to the REST backend
//! - Views computed from backend data (registration state, calendar, rosters)
//! - Authentication against the identity provider

pub mod activities;
pub mod attendance;
pub mod auth;
pub mod calendar;
pub mod event_plans;
pub mod events;
pub mod me;
pub mod registrations;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::i18n::TranslationParams;
use crate::middleware::{cors, log_request};
use crate::services::report::RenderedDocument;
use crate::services::ProxyResponse;
use crate::state::AppContext;
use crate::utils::errors::{ErrorSeverity, EventusError, IdentityError};
use crate::utils::helpers::sanitize_filename;

/// Build the application router with every route under `/api`
pub fn router(ctx: AppContext) -> Router {
    let api = Router::new()
        .route("/health", get(me::health))
        .route("/me", get(me::me))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/register", post(auth::register))
        .route("/event-plans", get(event_plans::list).post(event_plans::create))
        .route(
            "/event-plans/{id}",
            get(event_plans::get)
                .put(event_plans::update)
                .delete(event_plans::delete),
        )
        .route("/event-plans/{id}/report", get(event_plans::report))
        .route("/events", get(events::list).post(events::create))
        .route(
            "/events/{id}",
            get(events::get).put(events::update).delete(events::delete),
        )
        .route("/events/{id}/registration", get(events::registration))
        .route(
            "/events/{id}/registration/watch",
            get(events::watch_registration),
        )
        .route(
            "/events/{id}/register",
            post(events::register).delete(events::cancel),
        )
        .route("/activities", post(activities::create))
        .route(
            "/activities/{id}",
            get(activities::get).delete(activities::delete),
        )
        .route(
            "/activities/{id}/register",
            post(activities::register).delete(activities::cancel),
        )
        .route("/activities/{id}/attendance", get(activities::attendance))
        .route(
            "/activities/{id}/attendance/report",
            get(activities::attendance_report),
        )
        .route(
            "/attendance/{activity_id}/{user_id}",
            post(attendance::set_presence),
        )
        .route("/my-activities", get(registrations::my_activities))
        .route("/my-events", get(registrations::my_events))
        .route("/calendar", get(calendar::month))
        .fallback(not_found)
        .layer(from_fn(log_request))
        .layer(from_fn(cors));

    Router::new().nest("/api", api).with_state(ctx)
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response()
}

/// Error answer with a message in the caller's language
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    /// Translate an application error for `lang`
    pub fn new(ctx: &AppContext, lang: &str, err: EventusError) -> Self {
        match err.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => error!(error = %err, "Request failed"),
            ErrorSeverity::Warning => warn!(error = %err, "Request rejected"),
            ErrorSeverity::Info => debug!(error = %err, "Request rejected"),
        }

        let status = err.status_code();
        let body = match &err {
            // Backend failures keep their status and raw body
            EventusError::Upstream { message, details, .. } => {
                json!({ "message": message, "details": details })
            }
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => json!({
                "message": ctx.i18n.t(err.message_key(), lang, Some(&message_params(&err))),
                "error": err.to_string(),
            }),
            _ => json!({
                "message": ctx.i18n.t(err.message_key(), lang, Some(&message_params(&err))),
            }),
        };
        Self { status, body }
    }

    /// A specific message key with its own status
    pub fn message(
        ctx: &AppContext,
        lang: &str,
        status: StatusCode,
        key: &str,
        params: Option<&TranslationParams>,
    ) -> Self {
        debug!(status = status.as_u16(), key = key, "Request rejected");
        Self {
            status,
            body: json!({ "message": ctx.i18n.t(key, lang, params) }),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

fn message_params(err: &EventusError) -> TranslationParams {
    let mut params = TranslationParams::new();
    match err {
        EventusError::InvalidInput(reason) => {
            params.insert("reason".to_string(), reason.clone());
        }
        EventusError::Identity(IdentityError::ClientMissing(client)) => {
            params.insert("client".to_string(), client.clone());
        }
        EventusError::Identity(IdentityError::RoleMissing(role)) => {
            params.insert("role".to_string(), role.clone());
        }
        _ => {}
    }
    params
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Translate errors of a service call for the caller
pub(crate) trait Localize<T> {
    fn localized(self, ctx: &AppContext, lang: &str) -> Result<T, ApiError>;
}

impl<T> Localize<T> for crate::utils::errors::Result<T> {
    fn localized(self, ctx: &AppContext, lang: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(ctx, lang, e))
    }
}

/// Relay a backend answer with its status
pub(crate) fn proxy_response(response: ProxyResponse) -> Response {
    if response.body.is_null() {
        return response.status.into_response();
    }
    (response.status, Json(response.body)).into_response()
}

/// Serve a rendered document as a download
pub(crate) fn document_response(document: RenderedDocument) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&document.file_name)
    );
    let mut response = document.bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(document.content_type));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    response
}

/// Forward one request to the backend and relay the answer
pub(crate) async fn forward(
    ctx: &AppContext,
    lang: &str,
    token: &str,
    method: Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<&Value>,
) -> Result<Response, ApiError> {
    ctx.services
        .backend
        .forward(token, method, path, query, body)
        .await
        .map(proxy_response)
        .localized(ctx, lang)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::i18n::I18n;
    use crate::services::ServiceFactory;

    fn context() -> AppContext {
        let settings = Settings::default();
        let services = ServiceFactory::new(&settings).unwrap();
        let i18n = I18n::with_builtin(&settings.i18n).unwrap();
        AppContext::new(settings, services, i18n)
    }

    #[test]
    fn test_errors_are_localized() {
        let ctx = context();
        let err = ApiError::new(&ctx, "en", EventusError::PermissionDenied("manage events".into()));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.body()["message"], "You are not allowed to perform this action");

        let err = ApiError::new(
            &ctx,
            "pt-BR",
            EventusError::Identity(IdentityError::RoleMissing("admin".into())),
        );
        assert_eq!(err.body()["message"], "Role admin não encontrada");
    }

    #[test]
    fn test_internal_errors_carry_error_text() {
        let ctx = context();
        let err = ApiError::new(&ctx, "en", EventusError::Config("broken".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body()["message"], "Internal server error");
        assert_eq!(err.body()["error"], "Configuration error: broken");
    }

    #[test]
    fn test_upstream_body_is_kept() {
        let ctx = context();
        let err = ApiError::new(&ctx, "en", EventusError::upstream(409, "Conflict", "dup"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.body()["message"], "Backend error: 409 Conflict");
        assert_eq!(err.body()["details"], "dup");
    }

    #[test]
    fn test_empty_proxy_body_is_bodiless() {
        let response = proxy_response(ProxyResponse {
            status: StatusCode::NO_CONTENT,
            body: Value::Null,
        });
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
