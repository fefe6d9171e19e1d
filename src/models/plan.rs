//! Event plan model (logistics planning for an upcoming event)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::helpers::serde_date;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPlan {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(with = "serde_date")]
    pub event_date: NaiveDate,
    #[serde(default)]
    pub microphones: u32,
    #[serde(default)]
    pub projectors: u32,
    /// One room per line
    #[serde(default)]
    pub rooms: String,
    /// One team member per line
    #[serde(default)]
    pub members: String,
}

impl EventPlan {
    pub fn room_list(&self) -> Vec<&str> {
        non_blank_lines(&self.rooms)
    }

    pub fn member_list(&self) -> Vec<&str> {
        non_blank_lines(&self.members)
    }
}

fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Paged listing as returned by the backend
///
/// Some backend endpoints answer with a bare array instead; both shapes are
/// accepted and a bare array is a single page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    pub total_elements: Option<u64>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape<T> {
            #[serde(rename_all = "camelCase")]
            Paged {
                content: Vec<T>,
                #[serde(default)]
                total_pages: Option<u32>,
                #[serde(default)]
                total_elements: Option<u64>,
            },
            Bare(Vec<T>),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Paged {
                content,
                total_pages,
                total_elements,
            } => Page {
                content,
                total_pages: total_pages.unwrap_or(1),
                total_elements,
            },
            Shape::Bare(content) => Page {
                total_elements: Some(content.len() as u64),
                content,
                total_pages: 1,
            },
        })
    }
}
