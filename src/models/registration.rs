//! Registration models for events and activities

use serde::{Deserialize, Serialize};

/// Event-level registration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistration {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub registered: Option<bool>,
}

impl EventRegistration {
    /// Active registration of `subject_id`; a missing flag counts as inactive
    pub fn is_active_for(&self, subject_id: &str) -> bool {
        self.user_id == subject_id && self.registered.unwrap_or(false)
    }
}

/// Activity-level registration record, doubling as the attendance marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRegistration {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub present: Option<bool>,
    #[serde(default)]
    pub registered: Option<bool>,
}

impl ActivityRegistration {
    /// Active registration of `subject_id`; a record without the flag is unregistered
    pub fn is_active_for(&self, subject_id: &str) -> bool {
        self.user_id == subject_id && self.registered == Some(true)
    }
}
