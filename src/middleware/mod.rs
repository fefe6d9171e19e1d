//! Middleware module
//!
//! This module contains middleware and extractors for request processing

pub mod auth;
pub mod cors;
pub mod logging;

// Re-export commonly used middleware
pub use auth::{BearerToken, CurrentUser, Lang};
pub use cors::cors;
pub use logging::log_request;
