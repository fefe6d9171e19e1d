//! Identity provider client
//!
//! Talks to a Keycloak-compatible provider: password-grant login for
//! callers, and the admin flow that creates a user and grants it one of the
//! application roles. The registration flow is a fixed sequence of steps;
//! the first failing step fails the whole operation and nothing already
//! done is undone.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::IdentityConfig;
use crate::models::{RegisterUserRequest, Role};
use crate::utils::errors::{EventusError, IdentityError, IdentityResult, Result};
use crate::utils::helpers::is_valid_email;
use crate::utils::logging::log_upstream_error;

/// Token endpoint answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRepresentation {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientRepresentation {
    id: String,
    client_id: String,
}

/// Client for the identity provider
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    config: IdentityConfig,
}

impl IdentityClient {
    /// Create a new IdentityClient instance
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("Eventus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(EventusError::Http)?;

        Ok(Self {
            client,
            config: IdentityConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config.clone()
            },
        })
    }

    fn token_url(&self, realm: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.config.base_url, realm
        )
    }

    fn admin_url(&self, path: &str) -> String {
        format!(
            "{}/admin/realms/{}{}",
            self.config.base_url, self.config.realm, path
        )
    }

    async fn password_grant(
        &self,
        realm: &str,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> std::result::Result<TokenResponse, String> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "password")
            .append_pair("client_id", client_id)
            .append_pair("username", username)
            .append_pair("password", password)
            .finish();

        let response = self
            .client
            .post(self.token_url(realm))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let text = response.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            log_upstream_error("identity token", status.as_u16(), &text);
            return Err(format!("token endpoint answered {}", status));
        }
        serde_json::from_str(&text).map_err(|e| e.to_string())
    }

    /// Password-grant login against the application realm
    pub async fn login(&self, username: &str, password: &str) -> IdentityResult<TokenResponse> {
        debug!(username = %username, "Logging in through identity provider");
        self.password_grant(&self.config.realm, &self.config.client_id, username, password)
            .await
            .map_err(|reason| {
                debug!(username = %username, reason = %reason, "Login rejected");
                IdentityError::InvalidCredentials
            })
    }

    async fn admin_token(&self) -> IdentityResult<String> {
        self.password_grant(
            &self.config.admin_realm,
            &self.config.admin_client_id,
            &self.config.admin_username,
            &self.config.admin_password,
        )
        .await
        .map(|token| token.access_token)
        .map_err(|reason| {
            error!(reason = %reason, "Failed to obtain admin token");
            IdentityError::AdminToken
        })
    }

    async fn admin_get<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        label: &str,
        failure: IdentityError,
    ) -> IdentityResult<T> {
        let response = builder.send().await.map_err(|e| {
            error!(step = %label, error = %e, "Identity provider unreachable");
            failure.clone()
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|_| failure.clone())?;
        if !status.is_success() {
            log_upstream_error(label, status.as_u16(), &text);
            return Err(failure);
        }
        serde_json::from_str(&text).map_err(|e| {
            error!(step = %label, error = %e, "Unexpected identity provider answer");
            failure
        })
    }

    /// Create a user and grant it `request.role` on the role client
    ///
    /// Returns the new user's id.
    pub async fn register_user(&self, request: &RegisterUserRequest) -> Result<String> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(EventusError::InvalidInput(format!(
                "missing fields: {}",
                missing.join(", ")
            )));
        }
        let role: Role = request
            .role
            .parse()
            .map_err(EventusError::InvalidInput)?;
        if !is_valid_email(&request.email) {
            return Err(EventusError::InvalidInput(format!("invalid email: {}", request.email)));
        }

        let user_id = self.run_registration(request, role).await?;
        info!(username = %request.username, user_id = %user_id, role = %role, "User registered");
        Ok(user_id)
    }

    async fn run_registration(&self, request: &RegisterUserRequest, role: Role) -> IdentityResult<String> {
        let admin_token = self.admin_token().await?;

        self.create_user(&admin_token, request).await?;
        let user_id = self.lookup_user(&admin_token, &request.username).await?;
        let client = self.role_client(&admin_token).await?;
        let role_repr = self.client_role(&admin_token, &client.id, role).await?;
        self.assign_role(&admin_token, &user_id, &client.id, role_repr)
            .await?;

        Ok(user_id)
    }

    async fn create_user(&self, admin_token: &str, request: &RegisterUserRequest) -> IdentityResult<()> {
        let payload = json!({
            "firstName": request.first_name,
            "lastName": request.last_name,
            "email": request.email,
            "username": request.username,
            "enabled": true,
            "emailVerified": false,
            "attributes": {},
            "groups": [],
            "requiredActions": [],
            "credentials": [{
                "type": "password",
                "value": request.password,
                "temporary": false,
            }],
        });

        let response = self
            .client
            .post(self.admin_url("/users"))
            .bearer_auth(admin_token)
            .json(&payload)
            .send()
            .await
            .map_err(|_| IdentityError::CreateUser)?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        log_upstream_error("identity create user", status.as_u16(), &text);
        Err(classify_create_failure(&text))
    }

    async fn lookup_user(&self, admin_token: &str, username: &str) -> IdentityResult<String> {
        let users: Vec<UserRepresentation> = self
            .admin_get(
                self.client
                    .get(self.admin_url("/users"))
                    .query(&[("username", username)])
                    .bearer_auth(admin_token),
                "identity lookup user",
                IdentityError::LookupUser,
            )
            .await?;

        users
            .into_iter()
            .next()
            .map(|u| u.id)
            .ok_or(IdentityError::UserMissing)
    }

    async fn role_client(&self, admin_token: &str) -> IdentityResult<ClientRepresentation> {
        let clients: Vec<ClientRepresentation> = self
            .admin_get(
                self.client
                    .get(self.admin_url("/clients"))
                    .bearer_auth(admin_token),
                "identity list clients",
                IdentityError::ListClients,
            )
            .await?;

        clients
            .into_iter()
            .find(|c| c.client_id == self.config.role_client_id)
            .ok_or_else(|| IdentityError::ClientMissing(self.config.role_client_id.clone()))
    }

    /// The role representation is posted back as received
    async fn client_role(&self, admin_token: &str, client_uuid: &str, role: Role) -> IdentityResult<Value> {
        let roles: Vec<Value> = self
            .admin_get(
                self.client
                    .get(self.admin_url(&format!("/clients/{}/roles", client_uuid)))
                    .bearer_auth(admin_token),
                "identity list roles",
                IdentityError::ListRoles,
            )
            .await?;

        roles
            .into_iter()
            .find(|r| r.get("name").and_then(Value::as_str) == Some(role.as_str()))
            .ok_or_else(|| IdentityError::RoleMissing(role.to_string()))
    }

    async fn assign_role(
        &self,
        admin_token: &str,
        user_id: &str,
        client_uuid: &str,
        role: Value,
    ) -> IdentityResult<()> {
        let url = self.admin_url(&format!(
            "/users/{}/role-mappings/clients/{}",
            user_id, client_uuid
        ));
        let response = self
            .client
            .post(url)
            .bearer_auth(admin_token)
            .json(&[role])
            .send()
            .await
            .map_err(|_| IdentityError::AssignRole)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            log_upstream_error("identity assign role", status.as_u16(), &text);
            return Err(IdentityError::AssignRole);
        }
        Ok(())
    }
}

/// Map a create-user failure body onto the user-facing reason
pub fn classify_create_failure(body: &str) -> IdentityError {
    if body.contains("username") {
        IdentityError::UsernameTaken
    } else if body.contains("email") {
        IdentityError::EmailTaken
    } else {
        IdentityError::CreateUser
    }
}
