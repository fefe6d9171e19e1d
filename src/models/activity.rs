//! Activity model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::registration::ActivityRegistration;
use crate::utils::helpers::serde_date;

/// Activity belonging to one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "serde_date::option")]
    pub activity_date: Option<NaiveDate>,
    #[serde(default)]
    pub activity_time: Option<String>,
    /// Free-text label, e.g. lecture or workshop
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub event_id: Option<i64>,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub registrations: Vec<ActivityRegistration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(with = "serde_date")]
    pub activity_date: NaiveDate,
    pub activity_time: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub event_id: Option<i64>,
}

impl CreateActivityRequest {
    /// Field checks done before the request is forwarded
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name".to_string());
        }
        if chrono::NaiveTime::parse_from_str(&self.activity_time, "%H:%M").is_err()
            && chrono::NaiveTime::parse_from_str(&self.activity_time, "%H:%M:%S").is_err()
        {
            return Err("activityTime".to_string());
        }
        Ok(())
    }
}
