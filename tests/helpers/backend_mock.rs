//! Mock REST backend for testing
//!
//! A wiremock server answering the backend paths Eventus calls. Each helper
//! mounts one endpoint; tests combine what they need.

use serde_json::Value;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::page;

/// Mock backend server for testing
pub struct BackendMockServer {
    pub server: MockServer,
}

impl BackendMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer `verb path` with `status` and a JSON body
    pub async fn mock_json(&self, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer `verb path` with `status` and a raw text body
    pub async fn mock_text(&self, verb: &str, route: &str, status: u16, body: &str) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_events(&self, events: Vec<Value>) {
        self.mock_json("GET", "/events", 200, page(events)).await;
    }

    pub async fn mock_event(&self, event: Value) {
        let id = event["id"].as_i64().unwrap_or_default();
        self.mock_json("GET", &format!("/events/{}", id), 200, event).await;
    }

    /// Serve `first` once, then `then` for every later fetch
    pub async fn mock_event_sequence(&self, id: i64, first: Value, then: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/events/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(first))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/events/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(then))
            .with_priority(2)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_activity(&self, activity: Value) {
        let id = activity["id"].as_i64().unwrap_or_default();
        self.mock_json("GET", &format!("/activities/{}", id), 200, activity).await;
    }

    pub async fn mock_my_events(&self, events: Vec<Value>) {
        self.mock_json("GET", "/event-registrations/my-events", 200, page(events)).await;
    }

    pub async fn mock_my_activities(&self, activities: Vec<Value>) {
        self.mock_json("GET", "/activity-registrations/my-activities", 200, Value::Array(activities))
            .await;
    }

    /// Presence endpoint expecting `present`
    pub async fn mock_presence(&self, activity_id: i64, user_id: &str, present: bool, status: u16) {
        Mock::given(method("POST"))
            .and(path(format!("/attendance/{}/{}", activity_id, user_id)))
            .and(query_param("present", present.to_string()))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// DELETE endpoint that insists on the method override header
    pub async fn mock_delete(&self, route: &str, status: u16) {
        Mock::given(method("DELETE"))
            .and(path(route))
            .and(header("X-HTTP-Method-Override", "DELETE"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Requests the backend saw, for asserting on forwarded details
    pub async fn received(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}
