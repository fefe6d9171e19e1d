//! Event model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::activity::Activity;
use super::registration::EventRegistration;
use crate::utils::helpers::serde_date;

/// Event snapshot as returned by the backend, with nested activities and registrations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(with = "serde_date")]
    pub event_date: NaiveDate,
    #[serde(default, with = "serde_date::option")]
    pub registration_deadline: Option<NaiveDate>,
    /// Informational only, never enforced here
    #[serde(default)]
    pub max_registrations: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub activities: Vec<Activity>,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub registrations: Vec<EventRegistration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    #[serde(default)]
    pub max_registrations: Option<i32>,
    #[serde(with = "serde_date")]
    pub event_date: NaiveDate,
    #[serde(with = "serde_date")]
    pub registration_deadline: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl CreateEventRequest {
    /// Field checks done before the request is forwarded
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name".to_string());
        }
        if self.registration_deadline > self.event_date {
            return Err("registrationDeadline".to_string());
        }
        if matches!(self.max_registrations, Some(n) if n < 0) {
            return Err("maxRegistrations".to_string());
        }
        Ok(())
    }
}

impl Event {
    /// Find a nested activity by id
    pub fn activity(&self, activity_id: i64) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == activity_id)
    }

    /// Whether the registration window is still open on `today`
    pub fn registration_open(&self, today: NaiveDate) -> bool {
        match self.registration_deadline {
            Some(deadline) => today <= deadline,
            None => today <= self.event_date,
        }
    }
}
