//! Login, logout and self-service registration against a mock identity provider

mod helpers;

use axum::http::{Method, StatusCode};
use helpers::*;
use serde_json::{json, Value};

fn registration_body(role: &str) -> Value {
    json!({
        "firstName": "Ana",
        "lastName": "Souza",
        "email": "ana@ifpb.edu.br",
        "username": "ana.souza",
        "password": "s3nha-forte",
        "role": role
    })
}

async fn post_anonymous(ctx: &TestContext, uri: &str, body: Value) -> TestResponse {
    ctx.request(Method::POST, uri, None, Some(body)).await
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let ctx = TestContext::new().await;
    ctx.identity.mock_login("ana.souza", "segredo", "access-123", 300).await;

    let response = post_anonymous(
        &ctx,
        "/api/auth/login",
        json!({"username": "ana.souza", "password": "segredo"}),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["access_token"], "access-123");
    assert_eq!(response.json()["expires_in"], 300);

    let cookie = response.header("set-cookie").unwrap_or_default().to_string();
    assert!(cookie.starts_with("token=access-123"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=300"));
    assert!(cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let ctx = TestContext::new().await;
    ctx.identity.mock_login("ana.souza", "segredo", "access-123", 300).await;

    let response = post_anonymous(
        &ctx,
        "/api/auth/login",
        json!({"username": "ana.souza", "password": "errada"}),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["message"], "Usuário ou senha inválidos");
    assert!(response.header("set-cookie").is_none());
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let ctx = TestContext::new().await;

    let response = ctx.request(Method::POST, "/api/auth/logout", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Sessão encerrada");
    let cookie = response.header("set-cookie").unwrap_or_default();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_registration_runs_every_step() {
    let ctx = TestContext::new().await;
    ctx.identity
        .mock_registration_flow("ana.souza", "client_user", ROLE_CLIENT)
        .await;

    let response = post_anonymous(&ctx, "/api/auth/register", registration_body("client_user")).await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["message"], "Usuário criado com sucesso");
    assert_eq!(body["userId"], NEW_USER_ID);

    let created = ctx
        .identity
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path().ends_with("/users"))
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap_or(Value::Null));
    let created = created.unwrap_or(Value::Null);
    assert_eq!(created["username"], "ana.souza");
    assert_eq!(created["enabled"], true);
    assert_eq!(created["credentials"][0]["value"], "s3nha-forte");
    assert_eq!(created["credentials"][0]["temporary"], false);
}

#[tokio::test]
async fn test_username_conflict_is_bad_request() {
    let ctx = TestContext::new().await;
    ctx.identity.mock_admin_token().await;
    ctx.identity
        .mock_create_user(409, r#"{"errorMessage":"User exists with same username"}"#)
        .await;

    let response = post_anonymous(&ctx, "/api/auth/register", registration_body("client_user")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Nome de usuário já existe");
}

#[tokio::test]
async fn test_email_conflict_is_bad_request() {
    let ctx = TestContext::new().await;
    ctx.identity.mock_admin_token().await;
    ctx.identity
        .mock_create_user(409, r#"{"errorMessage":"User exists with same email"}"#)
        .await;

    let response = post_anonymous(&ctx, "/api/auth/register", registration_body("client_user")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Email já está em uso");
}

#[tokio::test]
async fn test_missing_role_fails_after_user_creation() {
    let ctx = TestContext::new().await;
    ctx.identity.mock_admin_token().await;
    ctx.identity.mock_create_user(201, "").await;
    ctx.identity.mock_lookup_user("ana.souza").await;
    ctx.identity.mock_clients(ROLE_CLIENT).await;
    ctx.identity.mock_roles(&["admin", "client_user"]).await;

    let response = post_anonymous(&ctx, "/api/auth/register", registration_body("client_admin")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["message"], "Role client_admin não encontrada");
}

#[tokio::test]
async fn test_missing_role_client() {
    let ctx = TestContext::new().await;
    ctx.identity.mock_admin_token().await;
    ctx.identity.mock_create_user(201, "").await;
    ctx.identity.mock_lookup_user("ana.souza").await;
    ctx.identity.mock_clients("some-other-client").await;

    let response = post_anonymous(&ctx, "/api/auth/register", registration_body("client_user")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json()["message"],
        format!("Cliente {} não encontrado", ROLE_CLIENT)
    );
}

#[tokio::test]
async fn test_missing_fields_never_reach_provider() {
    let ctx = TestContext::new().await;
    let mut body = registration_body("client_user");
    body["lastName"] = json!("  ");

    let response = post_anonymous(&ctx, "/api/auth/register", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Todos os campos são obrigatórios");
    let seen = ctx.identity.server.received_requests().await.unwrap_or_default();
    assert!(seen.is_empty());
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let ctx = TestContext::new().await;

    let response = post_anonymous(&ctx, "/api/auth/register", registration_body("superuser")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
