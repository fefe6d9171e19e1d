//! Authentication middleware
//!
//! Request extractors for the caller's bearer token and identity, plus the
//! session cookie helpers used by login and logout.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, SameSite};
use tracing::debug;

use crate::handlers::ApiError;
use crate::services::AuthContext;
use crate::state::AppContext;
use crate::utils::errors::EventusError;

/// Read the bearer token: `Authorization` header first, then the session cookie
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| Cookie::split_parse(v.to_string()))
        .filter_map(|c| c.ok())
        .find(|c| c.name() == cookie_name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// Session cookie carrying `token` for `max_age_seconds`
pub fn session_cookie(name: &str, token: &str, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build((name.to_string(), token.to_string()))
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age_seconds))
        .build()
}

/// Cookie that clears the session
pub fn clear_session_cookie(name: &str) -> Cookie<'static> {
    session_cookie(name, "", 0)
}

/// Language for user-facing messages of this request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lang(pub String);

impl<S> FromRequestParts<S> for Lang
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AppContext::from_ref(state);
        let header = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        Ok(Lang(ctx.i18n.detect_language(header)))
    }
}

/// The caller's raw bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AppContext::from_ref(state);
        match extract_token(&parts.headers, &ctx.settings.session.cookie_name) {
            Some(token) => Ok(BearerToken(token)),
            None => {
                debug!(path = %parts.uri.path(), "Request without bearer token");
                let Lang(lang) = Lang::from_request_parts(parts, state).await.unwrap_or_else(|e| match e {});
                Err(ApiError::new(
                    &ctx,
                    &lang,
                    EventusError::Authentication("token not provided".to_string()),
                ))
            }
        }
    }
}

/// The authenticated caller: token, principal and permissions
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub token: String,
    pub auth: AuthContext,
    pub lang: String,
}

impl CurrentUser {
    pub fn subject_id(&self) -> &str {
        &self.auth.principal.subject_id
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AppContext::from_ref(state);
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let Lang(lang) = Lang::from_request_parts(parts, state).await.unwrap_or_else(|e| match e {});

        let auth = ctx
            .services
            .auth_service
            .authenticate(&token)
            .map_err(|e| ApiError::new(&ctx, &lang, e))?;

        Ok(CurrentUser { token, auth, lang })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=from-cookie"));
        assert_eq!(extract_token(&headers, "token").as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; token=from-cookie"));
        assert_eq!(extract_token(&headers, "token").as_deref(), Some("from-cookie"));
        assert_eq!(extract_token(&headers, "session"), None);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(COOKIE, HeaderValue::from_static("token="));
        assert_eq!(extract_token(&headers, "token"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let set = session_cookie("token", "abc", 300).to_string();
        assert!(set.starts_with("token=abc"));
        assert!(set.contains("Path=/"));
        assert!(set.contains("Max-Age=300"));

        let cleared = clear_session_cookie("token").to_string();
        assert!(cleared.starts_with("token=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
