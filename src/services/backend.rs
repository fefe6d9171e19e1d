//! REST backend client
//!
//! Two ways of talking to the backend live here. [`BackendClient::forward`]
//! relays a request and shapes whatever comes back into the proxy contract
//! (status kept, body turned into JSON). [`BackendSession`] offers typed
//! calls for the views that compute something from backend data.
//!
//! Every request carries the caller's bearer token. There are no retries.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::models::{Activity, Event, EventPlan, Page};
use crate::services::attendance::PresenceUpdater;
use crate::utils::errors::{EventusError, Result};
use crate::utils::logging::log_upstream_error;

/// Relayed backend answer
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ProxyResponse {
    /// Shape a raw backend answer
    ///
    /// Success bodies are parsed as JSON; anything else is wrapped as
    /// `{message: "Success", rawResponse}`. Error bodies become
    /// `{message: "Backend error: <status> <reason>", details}`.
    pub fn from_raw(status: StatusCode, text: &str) -> Self {
        let body = if status.is_success() {
            if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(text)
                    .unwrap_or_else(|_| json!({ "message": "Success", "rawResponse": text }))
            }
        } else {
            json!({
                "message": upstream_message(status),
                "details": text,
            })
        };
        Self { status, body }
    }
}

fn upstream_message(status: StatusCode) -> String {
    format!(
        "Backend error: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
    .trim_end()
    .to_string()
}

/// Client for the REST backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new BackendClient instance
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("Eventus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(EventusError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bind a caller's token for typed calls
    pub fn session<'a>(&'a self, token: &'a str) -> BackendSession<'a> {
        BackendSession { client: self, token }
    }

    fn request(&self, method: Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "*/*");
        if method == Method::DELETE {
            builder = builder.header("X-HTTP-Method-Override", "DELETE");
        }
        builder
    }

    /// Relay a request and shape the answer
    pub async fn forward(
        &self,
        token: &str,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<ProxyResponse> {
        debug!(method = %method, path = %path, "Forwarding request to backend");

        let mut builder = self.request(method.clone(), path, token);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log_upstream_error(&format!("{} {}", method, path), status.as_u16(), &text);
        }
        Ok(ProxyResponse::from_raw(status, &text))
    }

    async fn send_expecting<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        label: &str,
    ) -> Result<T> {
        let text = self.send_checked(builder, label).await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(api = %label, error = %e, "Backend answered with an unexpected body");
            EventusError::Serialization(e)
        })
    }

    /// Send and return the body text of a successful answer
    async fn send_checked(&self, builder: reqwest::RequestBuilder, label: &str) -> Result<String> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log_upstream_error(label, status.as_u16(), &text);
            return Err(EventusError::upstream(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                text,
            ));
        }
        Ok(text)
    }
}

/// Backend calls on behalf of one caller
#[derive(Debug, Clone, Copy)]
pub struct BackendSession<'a> {
    client: &'a BackendClient,
    token: &'a str,
}

impl<'a> BackendSession<'a> {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let builder = self.client.request(Method::GET, path, self.token);
        self.client.send_expecting(builder, &format!("GET {}", path)).await
    }

    /// Mutations may answer with an empty or non-JSON body
    async fn mutate(&self, method: Method, path: &str) -> Result<Value> {
        let label = format!("{} {}", method, path);
        let builder = self.client.request(method, path, self.token);
        let text = self.client.send_checked(builder, &label).await?;
        Ok(ProxyResponse::from_raw(StatusCode::OK, &text).body)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        let page: Page<Event> = self.get("/events").await?;
        Ok(page.content)
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Event> {
        self.get(&format!("/events/{}", event_id)).await
    }

    pub async fn get_activity(&self, activity_id: i64) -> Result<Activity> {
        self.get(&format!("/activities/{}", activity_id)).await
    }

    pub async fn my_events(&self) -> Result<Vec<Event>> {
        let page: Page<Event> = self.get("/event-registrations/my-events").await?;
        Ok(page.content)
    }

    pub async fn my_activities(&self) -> Result<Vec<Activity>> {
        let page: Page<Activity> = self.get("/activity-registrations/my-activities").await?;
        Ok(page.content)
    }

    pub async fn register_for_event(&self, event_id: i64) -> Result<Value> {
        self.mutate(Method::POST, &format!("/event-registrations/{}/register", event_id))
            .await
    }

    pub async fn cancel_event_registration(&self, registration_id: i64) -> Result<()> {
        self.mutate(Method::DELETE, &format!("/event-registrations/{}", registration_id))
            .await
            .map(|_| ())
    }

    pub async fn register_for_activity(&self, activity_id: i64) -> Result<Value> {
        self.mutate(Method::POST, &format!("/activity-registrations/{}/register", activity_id))
            .await
    }

    pub async fn cancel_activity_registration(&self, registration_id: i64) -> Result<()> {
        self.mutate(Method::DELETE, &format!("/activity-registrations/{}", registration_id))
            .await
            .map(|_| ())
    }

    pub async fn get_event_plan(&self, plan_id: i64) -> Result<EventPlan> {
        self.get(&format!("/event-plans/{}", plan_id)).await
    }

    /// Set the presence flag of one registration
    pub async fn update_presence(&self, activity_id: i64, user_id: &str, present: bool) -> Result<()> {
        let path = format!(
            "/attendance/{}/{}?present={}",
            activity_id,
            urlencoding::encode(user_id),
            present
        );
        self.mutate(Method::POST, &path).await.map(|_| ())
    }
}

#[async_trait]
impl PresenceUpdater for BackendSession<'_> {
    async fn set_presence(&self, activity_id: i64, user_id: &str, present: bool) -> Result<()> {
        self.update_presence(activity_id, user_id, present).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_json_is_passed_through() {
        let shaped = ProxyResponse::from_raw(StatusCode::OK, r#"{"id": 3}"#);
        assert_eq!(shaped.body, json!({"id": 3}));
    }

    #[test]
    fn test_success_text_is_wrapped() {
        let shaped = ProxyResponse::from_raw(StatusCode::CREATED, "created");
        assert_eq!(shaped.status, StatusCode::CREATED);
        assert_eq!(
            shaped.body,
            json!({"message": "Success", "rawResponse": "created"})
        );
    }

    #[test]
    fn test_error_keeps_status_and_details() {
        let shaped = ProxyResponse::from_raw(StatusCode::CONFLICT, "already registered");
        assert_eq!(shaped.status, StatusCode::CONFLICT);
        assert_eq!(shaped.body["message"], "Backend error: 409 Conflict");
        assert_eq!(shaped.body["details"], "already registered");
    }

    #[test]
    fn test_empty_success_is_null() {
        assert_eq!(ProxyResponse::from_raw(StatusCode::NO_CONTENT, "").body, Value::Null);
    }
}
