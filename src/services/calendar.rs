//! Calendar aggregation
//!
//! Flattens events and their activities into dated calendar items, applies
//! the registered-only and category filters, and buckets items by calendar
//! day for one month. Everything here is pure.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::Event;
use crate::services::registration::RegistrationLookup;
use crate::utils::errors::{EventusError, Result};
use crate::utils::helpers::serde_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Event,
    Activity,
}

/// One entry on the calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    #[serde(with = "serde_date")]
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub event_id: Option<i64>,
    pub event_name: Option<String>,
    pub is_registered: bool,
}

/// Filters applied while aggregating
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarFilter {
    pub registered_only: bool,
    /// Empty means every category
    pub categories: Vec<String>,
}

impl CalendarFilter {
    fn admits_category(&self, category: Option<&str>) -> bool {
        if self.categories.is_empty() {
            return true;
        }
        category
            .map(|c| self.categories.iter().any(|wanted| wanted == c))
            .unwrap_or(false)
    }
}

/// Items falling on one day of the month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    #[serde(with = "serde_date")]
    pub date: NaiveDate,
    pub items: Vec<CalendarItem>,
}

/// Category choices offered by the calendar filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "categories", rename_all = "camelCase")]
pub enum CategoryOptions {
    Available(Vec<String>),
    NoneAvailable,
}

/// Calendar aggregator
#[derive(Debug, Clone)]
pub struct CalendarAggregator {
    default_location: String,
}

impl CalendarAggregator {
    /// `default_location` is shown for events that have no location
    pub fn new(default_location: impl Into<String>) -> Self {
        Self {
            default_location: default_location.into(),
        }
    }

    /// Events first in input order, then activities in event-then-activity order
    pub fn aggregate(
        &self,
        events: &[Event],
        lookup: &RegistrationLookup,
        filter: &CalendarFilter,
    ) -> Vec<CalendarItem> {
        let mut items = Vec::new();

        for event in events {
            let is_registered = lookup.is_event_registered(event.id);
            if filter.registered_only && !is_registered {
                continue;
            }
            items.push(CalendarItem {
                id: event.id,
                item_type: ItemType::Event,
                name: event.name.clone(),
                date: event.event_date,
                time: None,
                location: Some(
                    event
                        .location
                        .clone()
                        .filter(|l| !l.trim().is_empty())
                        .unwrap_or_else(|| self.default_location.clone()),
                ),
                category: None,
                event_id: None,
                event_name: None,
                is_registered,
            });
        }

        for event in events {
            for activity in &event.activities {
                let Some(date) = activity.activity_date else {
                    continue;
                };
                let is_registered = lookup.is_activity_registered(event.id, activity.id);
                if filter.registered_only && !is_registered {
                    continue;
                }
                if !filter.admits_category(activity.category.as_deref()) {
                    continue;
                }
                items.push(CalendarItem {
                    id: activity.id,
                    item_type: ItemType::Activity,
                    name: activity.name.clone(),
                    date,
                    time: activity.activity_time.clone(),
                    location: activity.location.clone(),
                    category: activity.category.clone(),
                    event_id: Some(event.id),
                    event_name: Some(event.name.clone()),
                    is_registered,
                });
            }
        }

        items
    }
}

/// One bucket per day of `month`, each holding the items dated that day
pub fn month_buckets(items: &[CalendarItem], year: i32, month: u32) -> Result<Vec<DayBucket>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EventusError::InvalidInput(format!("invalid month {}-{}", year, month)))?;

    Ok(first
        .iter_days()
        .take_while(|day| day.month() == month)
        .map(|date| DayBucket {
            date,
            items: items_on(items, date),
        })
        .collect())
}

/// Items dated `date`, in aggregation order
pub fn items_on(items: &[CalendarItem], date: NaiveDate) -> Vec<CalendarItem> {
    items.iter().filter(|item| item.date == date).cloned().collect()
}

/// Distinct activity categories in first-seen order
pub fn available_categories(events: &[Event]) -> CategoryOptions {
    let mut categories: Vec<String> = Vec::new();
    for category in events
        .iter()
        .flat_map(|e| e.activities.iter())
        .filter_map(|a| a.category.as_deref())
        .filter(|c| !c.trim().is_empty())
    {
        if !categories.iter().any(|seen| seen == category) {
            categories.push(category.to_string());
        }
    }

    if categories.is_empty() {
        CategoryOptions::NoneAvailable
    } else {
        CategoryOptions::Available(categories)
    }
}
