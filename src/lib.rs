//! Eventus
//!
//! Conference and event management service. Eventus sits between a browser
//! client and a REST backend: it relays event, activity and plan requests,
//! computes each caller's registration state, builds the event calendar,
//! runs attendance rosters and reports, and handles login and self-service
//! registration against a Keycloak-compatible identity provider.

pub mod config;
pub mod handlers;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{EventusError, Result};

// Re-export main components for easy access
pub use handlers::router;
pub use i18n::I18n;
pub use services::ServiceFactory;
pub use state::AppContext;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
