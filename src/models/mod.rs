//! Data models module
//!
//! This module contains all data structures exchanged with the backend and
//! the identity provider.

pub mod activity;
pub mod event;
pub mod plan;
pub mod registration;
pub mod user;

// Re-export commonly used models
pub use activity::{Activity, CreateActivityRequest};
pub use event::{CreateEventRequest, Event};
pub use plan::{EventPlan, Page};
pub use registration::{ActivityRegistration, EventRegistration};
pub use user::{LoginRequest, Principal, RegisterUserRequest, Role};

use serde::{Deserialize, Deserializer};

/// The backend sends `null` for empty nested lists in some responses
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
