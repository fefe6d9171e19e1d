//! Event and activity registration through the API
//!
//! The registration state is always inferred from the event the backend
//! returns after the change, never from the change request itself.

mod helpers;

use axum::http::{Method, StatusCode};
use helpers::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_registration_state_is_per_caller() {
    let ctx = TestContext::new().await;
    ctx.backend.mock_event(scenario_event()).await;

    let response = ctx.get("/api/events/1/registration", &attendee_token("u1")).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["registration"]["eventRegistered"], true);
    assert_eq!(body["registration"]["eventRegistrationId"], 50);
    assert_eq!(body["registration"]["registeredActivityIds"], json!([]));
    assert_eq!(body["pending"], json!([]));
    assert_eq!(body["event"]["name"], "Semana de Tecnologia");

    let response = ctx.get("/api/events/1/registration", &attendee_token("u2")).await;
    let body = response.json();
    assert_eq!(body["registration"]["eventRegistered"], false);
    assert_eq!(body["registration"]["eventRegistrationId"], json!(null));
}

#[tokio::test]
async fn test_inactive_activity_registration_is_ignored() {
    let ctx = TestContext::new().await;
    let mut event = scenario_event();
    event["activities"][0]["registrations"][0]["registered"] = json!(true);
    ctx.backend.mock_event(event).await;

    let response = ctx.get("/api/events/1/registration", &attendee_token("u1")).await;
    let body = response.json();
    assert_eq!(body["registration"]["registeredActivityIds"], json!([10]));
    assert_eq!(body["registration"]["activityRegistrationIds"], json!({"10": 100}));
}

#[tokio::test]
async fn test_register_refetches_the_event() {
    let ctx = TestContext::new().await;
    let before = event(1, "Semana de Tecnologia", "2024-05-10", vec![], vec![]);
    let after = event(
        1,
        "Semana de Tecnologia",
        "2024-05-10",
        vec![],
        vec![event_registration(51, "u2", Some(true))],
    );
    ctx.backend.mock_event_sequence(1, before, after).await;
    Mock::given(method("POST"))
        .and(path("/event-registrations/1/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 51})))
        .expect(1)
        .mount(&ctx.backend.server)
        .await;

    let response = ctx.post("/api/events/1/register", &attendee_token("u2"), None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["registration"]["eventRegistered"], true);
    assert_eq!(body["registration"]["eventRegistrationId"], 51);
    assert_eq!(body["pending"], json!([]));

    let fetches = ctx
        .backend
        .received()
        .await
        .into_iter()
        .filter(|r| r.url.path() == "/events/1")
        .count();
    assert_eq!(fetches, 2);
}

#[tokio::test]
async fn test_snapshot_wins_over_requested_change() {
    let ctx = TestContext::new().await;
    ctx.backend
        .mock_event(event(1, "Semana de Tecnologia", "2024-05-10", vec![], vec![]))
        .await;
    ctx.backend
        .mock_json("POST", "/event-registrations/1/register", 200, json!({}))
        .await;

    let response = ctx.post("/api/events/1/register", &attendee_token("u2"), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["registration"]["eventRegistered"], false);
}

#[tokio::test]
async fn test_register_twice_is_a_conflict() {
    let ctx = TestContext::new().await;
    ctx.backend.mock_event(scenario_event()).await;

    let response = ctx.post("/api/events/1/register", &attendee_token("u1"), None).await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json()["message"], "Usuário já inscrito neste evento.");
    let registrations = ctx
        .backend
        .received()
        .await
        .into_iter()
        .filter(|r| r.url.path().starts_with("/event-registrations"))
        .count();
    assert_eq!(registrations, 0);
}

#[tokio::test]
async fn test_rejected_registration_keeps_backend_status() {
    let ctx = TestContext::new().await;
    ctx.backend
        .mock_event(event(1, "Semana de Tecnologia", "2024-05-10", vec![], vec![]))
        .await;
    ctx.backend
        .mock_text("POST", "/event-registrations/1/register", 400, "Inscrições encerradas")
        .await;

    let response = ctx.post("/api/events/1/register", &attendee_token("u2"), None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["details"], "Inscrições encerradas");
}

#[tokio::test]
async fn test_cancel_uses_the_registration_id() {
    let ctx = TestContext::new().await;
    let after = event(
        1,
        "Semana de Tecnologia",
        "2024-05-10",
        vec![],
        vec![event_registration(50, "u1", Some(false))],
    );
    ctx.backend.mock_event_sequence(1, scenario_event(), after).await;
    ctx.backend.mock_delete("/event-registrations/50", 204).await;

    let response = ctx.delete("/api/events/1/register", &attendee_token("u1")).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["registration"]["eventRegistered"], false);
    assert_eq!(body["registration"]["eventRegistrationId"], json!(null));
}

#[tokio::test]
async fn test_cancel_without_registration_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.backend.mock_event(scenario_event()).await;

    let response = ctx.delete("/api/events/1/register", &attendee_token("u2")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_activity_registration_and_cancel() {
    let ctx = TestContext::new().await;
    ctx.backend
        .mock_json("POST", "/activity-registrations/10/register", 200, json!({"id": 101}))
        .await;

    let response = ctx.post("/api/activities/10/register", &attendee_token("u2"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["id"], 101);

    let registered = activity(
        10,
        "Rust na prática",
        "2024-05-11",
        "Dev",
        vec![activity_registration(101, "u2", "Bruno Lima", false)],
    );
    ctx.backend.mock_activity(registered).await;
    ctx.backend.mock_delete("/activity-registrations/101", 204).await;

    let response = ctx.delete("/api/activities/10/register", &attendee_token("u2")).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_watch_streams_until_registration_ends() {
    let ctx = TestContext::new().await;
    let after = event(
        1,
        "Semana de Tecnologia",
        "2024-05-10",
        vec![],
        vec![event_registration(50, "u1", Some(false))],
    );
    ctx.backend.mock_event_sequence(1, scenario_event(), after).await;

    let response = ctx
        .request(
            Method::GET,
            "/api/events/1/registration/watch",
            Some(&attendee_token("u1")),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("text/event-stream"));
    let text = response.text();
    let frames: Vec<&str> = text
        .split("\n\n")
        .filter(|frame| frame.contains("event: registration"))
        .collect();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].contains("\"eventRegistered\":true"));
    assert!(frames[1].contains("\"eventRegistered\":false"));
}

#[tokio::test]
async fn test_watch_for_unregistered_caller_sends_one_frame() {
    let ctx = TestContext::new().await;
    ctx.backend.mock_event(scenario_event()).await;

    let response = ctx
        .request(
            Method::GET,
            "/api/events/1/registration/watch",
            Some(&attendee_token("u9")),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let text = response.text();
    let frames: Vec<&str> = text
        .split("\n\n")
        .filter(|frame| frame.contains("event: registration"))
        .collect();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].contains("\"eventRegistered\":false"));

    let fetches = ctx
        .backend
        .received()
        .await
        .into_iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == "/events/1")
        .count();
    assert_eq!(fetches, 1);
}
