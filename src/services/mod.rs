//! Services module
//!
//! This module contains business logic services and the outbound clients

pub mod attendance;
pub mod auth;
pub mod backend;
pub mod calendar;
pub mod claims;
pub mod identity;
pub mod registration;
pub mod report;

// Re-export commonly used services
pub use attendance::{AttendanceBoard, AttendanceRoster, Participant, PresenceUpdater};
pub use auth::{AuthContext, AuthService, Permission};
pub use backend::{BackendClient, BackendSession, ProxyResponse};
pub use calendar::{CalendarAggregator, CalendarFilter, CalendarItem, CategoryOptions};
pub use claims::{decode_claims, TokenClaims};
pub use identity::{IdentityClient, TokenResponse};
pub use registration::{
    reconcile, RegistrationLookup, RegistrationState, RegistrationWatcher, WatcherHandle,
};
pub use report::{AttendanceReport, CsvRenderer, EventPlanReport, ReportRenderer, TextRenderer};

use crate::config::settings::Settings;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub backend: BackendClient,
    pub identity: IdentityClient,
    pub calendar: CalendarAggregator,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            auth_service: AuthService::new(settings.identity.role_client_id.clone()),
            backend: BackendClient::new(&settings.backend)?,
            identity: IdentityClient::new(&settings.identity)?,
            calendar: CalendarAggregator::new(settings.calendar.default_location.clone()),
        })
    }

    /// Health check for all services
    pub fn health_check(&self) -> ServiceHealthStatus {
        ServiceHealthStatus {
            backend_url: self.backend.base_url().to_string(),
            auth_service_ready: true,
            calendar_ready: true,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealthStatus {
    pub backend_url: String,
    pub auth_service_ready: bool,
    pub calendar_ready: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.auth_service_ready && self.calendar_ready
    }
}
