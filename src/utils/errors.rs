//! Error handling for Eventus
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy, including the mapping of
//! every error onto an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for Eventus application
#[derive(Error, Debug)]
pub enum EventusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Activity not found: {activity_id}")]
    ActivityNotFound { activity_id: i64 },

    #[error("Participant not found: {participant_id}")]
    ParticipantNotFound { participant_id: i64 },

    #[error("Upstream error {status}: {message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Attendance error: {0}")]
    Attendance(#[from] ToggleError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Action already in progress: {0}")]
    Busy(String),
}

/// Identity provider specific errors
///
/// Each step of the registration flow has its own variant so callers can
/// tell which step failed. None of them is compensated: a user created
/// before a later step fails stays created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("failed to obtain admin token")]
    AdminToken,

    #[error("username already exists")]
    UsernameTaken,

    #[error("email already in use")]
    EmailTaken,

    #[error("failed to create user")]
    CreateUser,

    #[error("failed to look up user")]
    LookupUser,

    #[error("user not found after creation")]
    UserMissing,

    #[error("failed to list clients")]
    ListClients,

    #[error("client {0} not found")]
    ClientMissing(String),

    #[error("failed to list roles")]
    ListRoles,

    #[error("role {0} not found")]
    RoleMissing(String),

    #[error("failed to assign role")]
    AssignRole,
}

/// Presence toggle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToggleError {
    #[error("participant {0} is not on the roster")]
    UnknownParticipant(i64),

    #[error("a presence update for participant {0} is already in flight")]
    InFlight(i64),

    #[error("presence update rejected: {0}")]
    Rejected(String),
}

/// Result type alias for Eventus operations
pub type Result<T> = std::result::Result<T, EventusError>;

/// Result type alias for identity provider operations
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;

impl EventusError {
    /// Build an upstream error from a backend status and raw body
    pub fn upstream(status: u16, reason: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        EventusError::Upstream {
            status,
            message: format!("Backend error: {} {}", status, reason).trim_end().to_string(),
            details: if body.is_empty() { None } else { Some(body) },
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            EventusError::Config(_) => false,
            EventusError::Authentication(_) => false,
            EventusError::PermissionDenied(_) => false,
            EventusError::EventNotFound { .. } => false,
            EventusError::ActivityNotFound { .. } => false,
            EventusError::ParticipantNotFound { .. } => false,
            EventusError::Upstream { status, .. } => *status >= 500,
            EventusError::Identity(_) => false,
            EventusError::Attendance(ToggleError::InFlight(_)) => true,
            EventusError::Attendance(_) => false,
            EventusError::Http(_) => true,
            EventusError::Serialization(_) => false,
            EventusError::Io(_) => true,
            EventusError::UrlParse(_) => false,
            EventusError::Csv(_) => false,
            EventusError::InvalidInput(_) => false,
            EventusError::Busy(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EventusError::Config(_) => ErrorSeverity::Critical,
            EventusError::PermissionDenied(_) => ErrorSeverity::Warning,
            EventusError::Authentication(_) => ErrorSeverity::Warning,
            EventusError::Busy(_) => ErrorSeverity::Warning,
            EventusError::InvalidInput(_) => ErrorSeverity::Info,
            EventusError::EventNotFound { .. }
            | EventusError::ActivityNotFound { .. }
            | EventusError::ParticipantNotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            EventusError::Authentication(_) => StatusCode::UNAUTHORIZED,
            EventusError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            EventusError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EventusError::EventNotFound { .. }
            | EventusError::ActivityNotFound { .. }
            | EventusError::ParticipantNotFound { .. } => StatusCode::NOT_FOUND,
            EventusError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            EventusError::Identity(e) => match e {
                IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                IdentityError::UsernameTaken
                | IdentityError::EmailTaken
                | IdentityError::CreateUser => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            EventusError::Attendance(ToggleError::UnknownParticipant(_)) => StatusCode::NOT_FOUND,
            EventusError::Attendance(ToggleError::InFlight(_)) | EventusError::Busy(_) => {
                StatusCode::CONFLICT
            }
            EventusError::Attendance(ToggleError::Rejected(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translation key for the user-facing message of this error
    pub fn message_key(&self) -> &'static str {
        match self {
            EventusError::Authentication(_) => "errors.unauthenticated",
            EventusError::PermissionDenied(_) => "errors.forbidden",
            EventusError::EventNotFound { .. } => "errors.event_not_found",
            EventusError::ActivityNotFound { .. } => "errors.activity_not_found",
            EventusError::ParticipantNotFound { .. } => "errors.participant_not_found",
            EventusError::Upstream { .. } => "errors.upstream",
            EventusError::Identity(e) => match e {
                IdentityError::InvalidCredentials => "auth.invalid_credentials",
                IdentityError::AdminToken => "auth.admin_token_failed",
                IdentityError::UsernameTaken => "auth.username_taken",
                IdentityError::EmailTaken => "auth.email_taken",
                IdentityError::CreateUser => "auth.create_user_failed",
                IdentityError::LookupUser => "auth.lookup_user_failed",
                IdentityError::UserMissing => "auth.user_missing",
                IdentityError::ListClients => "auth.list_clients_failed",
                IdentityError::ClientMissing(_) => "auth.client_missing",
                IdentityError::ListRoles => "auth.list_roles_failed",
                IdentityError::RoleMissing(_) => "auth.role_missing",
                IdentityError::AssignRole => "auth.assign_role_failed",
            },
            EventusError::Attendance(ToggleError::InFlight(_)) | EventusError::Busy(_) => {
                "errors.in_flight"
            }
            EventusError::Attendance(_) => "attendance.update_failed",
            EventusError::InvalidInput(_) => "errors.invalid_input",
            _ => "errors.internal",
        }
    }
}

/// Errors that escape a handler are reported as `{message, details?}`.
///
/// Handlers that know the caller's language translate first via
/// [`crate::handlers::ApiError`]; this fallback uses the error's own text.
impl IntoResponse for EventusError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            EventusError::Upstream { message, details, .. } => {
                json!({ "message": message, "details": details })
            }
            other => json!({ "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
