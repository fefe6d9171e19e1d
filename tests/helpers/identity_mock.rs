//! Mock identity provider for testing
//!
//! Simulates the Keycloak token endpoint and the admin API steps used by
//! self-service registration.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REALM: &str = "lucassousa";
pub const CLIENT_UUID: &str = "c0ffee00-0000-4000-8000-000000000001";
pub const NEW_USER_ID: &str = "a1b2c3d4-0000-4000-8000-000000000002";

/// Mock identity provider
pub struct IdentityMockServer {
    pub server: MockServer,
}

impl IdentityMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Password grant that accepts exactly `username`/`password`
    pub async fn mock_login(&self, username: &str, password: &str, access_token: &str, expires_in: i64) {
        Mock::given(method("POST"))
            .and(path(format!("/realms/{}/protocol/openid-connect/token", REALM)))
            .and(body_string_contains(format!("username={}", username)))
            .and(body_string_contains(format!("password={}", password)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "expires_in": expires_in,
                "refresh_token": "refresh",
                "token_type": "Bearer",
            })))
            .with_priority(1)
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("/realms/{}/protocol/openid-connect/token", REALM)))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid user credentials",
            })))
            .with_priority(5)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_admin_token(&self) {
        Mock::given(method("POST"))
            .and(path("/realms/master/protocol/openid-connect/token"))
            .and(body_string_contains("client_id=admin-cli"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "admin-access",
                "expires_in": 60,
            })))
            .mount(&self.server)
            .await;
    }

    /// User creation answering `status` with `body`
    pub async fn mock_create_user(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/admin/realms/{}/users", REALM)))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_lookup_user(&self, username: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/admin/realms/{}/users", REALM)))
            .and(query_param("username", username))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": NEW_USER_ID, "username": username }
            ])))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_clients(&self, role_client_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/admin/realms/{}/clients", REALM)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "other-uuid", "clientId": "account" },
                { "id": CLIENT_UUID, "clientId": role_client_id },
            ])))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_roles(&self, names: &[&str]) {
        let roles: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({ "id": format!("role-{}", i), "name": name, "composite": false }))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/admin/realms/{}/clients/{}/roles", REALM, CLIENT_UUID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(roles))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_assign_role(&self, role: &str) {
        Mock::given(method("POST"))
            .and(path(format!(
                "/admin/realms/{}/users/{}/role-mappings/clients/{}",
                REALM, NEW_USER_ID, CLIENT_UUID
            )))
            .and(body_string_contains(format!("\"name\":\"{}\"", role)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Every step of a successful registration for `username` with `role`
    pub async fn mock_registration_flow(&self, username: &str, role: &str, role_client_id: &str) {
        self.mock_admin_token().await;
        self.mock_create_user(201, "").await;
        self.mock_lookup_user(username).await;
        self.mock_clients(role_client_id).await;
        self.mock_roles(&["admin", "client_admin", "client_user"]).await;
        self.mock_assign_role(role).await;
    }
}
