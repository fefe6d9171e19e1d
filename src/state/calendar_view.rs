//! Calendar view state
//!
//! The displayed month, the selected day and the filters. Transitions are
//! plain methods; rendering runs the aggregator over fetched data.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::models::Event;
use crate::services::calendar::{
    available_categories, items_on, month_buckets, CalendarAggregator, CalendarFilter,
    CalendarItem, CategoryOptions, DayBucket,
};
use crate::services::registration::RegistrationLookup;
use crate::utils::errors::{EventusError, Result};
use crate::utils::helpers::serde_date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarViewState {
    month_start: NaiveDate,
    selected_day: Option<NaiveDate>,
    filter: CalendarFilter,
}

/// Rendered month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonthView {
    pub year: i32,
    pub month: u32,
    pub registered_only: bool,
    pub selected_categories: Vec<String>,
    pub category_options: CategoryOptions,
    pub items: Vec<CalendarItem>,
    pub days: Vec<DayBucket>,
    #[serde(with = "serde_date::option")]
    pub selected_day: Option<NaiveDate>,
    pub day_items: Vec<CalendarItem>,
}

impl CalendarViewState {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let month_start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| EventusError::InvalidInput(format!("invalid month {}-{}", year, month)))?;
        Ok(Self {
            month_start,
            selected_day: None,
            filter: CalendarFilter::default(),
        })
    }

    /// State for the month containing `today`
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            month_start: today.with_day(1).unwrap_or(today),
            selected_day: None,
            filter: CalendarFilter::default(),
        }
    }

    pub fn year(&self) -> i32 {
        self.month_start.year()
    }

    pub fn month(&self) -> u32 {
        self.month_start.month()
    }

    pub fn selected_day(&self) -> Option<NaiveDate> {
        self.selected_day
    }

    pub fn filter(&self) -> &CalendarFilter {
        &self.filter
    }

    /// Selecting the selected day clears it; any other day replaces it
    pub fn select_day(&mut self, day: NaiveDate) {
        self.selected_day = if self.selected_day == Some(day) {
            None
        } else {
            Some(day)
        };
    }

    pub fn next_month(&mut self) {
        if let Some(next) = self.month_start.checked_add_months(Months::new(1)) {
            self.month_start = next;
        }
        self.selected_day = None;
    }

    pub fn previous_month(&mut self) {
        if let Some(previous) = self.month_start.checked_sub_months(Months::new(1)) {
            self.month_start = previous;
        }
        self.selected_day = None;
    }

    pub fn set_registered_only(&mut self, registered_only: bool) {
        self.filter.registered_only = registered_only;
    }

    /// Add the category if absent, remove it if present
    pub fn toggle_category(&mut self, category: &str) {
        if let Some(pos) = self.filter.categories.iter().position(|c| c == category) {
            self.filter.categories.remove(pos);
        } else {
            self.filter.categories.push(category.to_string());
        }
    }

    pub fn render(
        &self,
        aggregator: &CalendarAggregator,
        events: &[Event],
        lookup: &RegistrationLookup,
    ) -> Result<CalendarMonthView> {
        let items = aggregator.aggregate(events, lookup, &self.filter);
        let days = month_buckets(&items, self.year(), self.month())?;
        let day_items = self
            .selected_day
            .map(|day| items_on(&items, day))
            .unwrap_or_default();

        Ok(CalendarMonthView {
            year: self.year(),
            month: self.month(),
            registered_only: self.filter.registered_only,
            selected_categories: self.filter.categories.clone(),
            category_options: available_categories(events),
            items,
            days,
            selected_day: self.selected_day,
            day_items,
        })
    }
}
