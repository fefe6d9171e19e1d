//! Test context for unified test setup
//!
//! Starts both mock servers, points the settings at them and builds the
//! application router. Requests go through `tower::ServiceExt::oneshot`, so
//! no socket is bound for Eventus itself.

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use eventus::config::Settings;
use eventus::{router, AppContext, I18n, ServiceFactory};

use super::{BackendMockServer, IdentityMockServer};

/// Response captured from the router
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub backend: BackendMockServer,
    pub identity: IdentityMockServer,
    pub settings: Settings,
    pub app: Router,
}

impl TestContext {
    pub async fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let backend = BackendMockServer::new().await;
        let identity = IdentityMockServer::new().await;
        let settings = Self::create_test_settings(&backend, &identity);

        let services = ServiceFactory::new(&settings).expect("failed to build services");
        let i18n = I18n::with_builtin(&settings.i18n).expect("failed to load translations");
        let app = router(AppContext::new(settings.clone(), services, i18n));

        Self {
            backend,
            identity,
            settings,
            app,
        }
    }

    fn create_test_settings(backend: &BackendMockServer, identity: &IdentityMockServer) -> Settings {
        let mut settings = Settings::default();
        settings.backend.base_url = backend.uri();
        settings.backend.timeout_seconds = 5;
        settings.identity.base_url = identity.uri();
        settings.identity.timeout_seconds = 5;
        settings.session.recheck_interval_seconds = 1;
        settings.i18n.translations_dir = "does-not-exist".to_string();
        settings
    }

    /// Send a request through the router
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.request_with_headers(method, uri, token, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body")
            .to_vec();

        TestResponse {
            status,
            headers,
            bytes,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Option<Value>) -> TestResponse {
        self.request(Method::POST, uri, Some(token), body).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }
}
