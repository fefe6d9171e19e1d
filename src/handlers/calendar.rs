//! Calendar handler

use std::future::Future;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ApiError, Localize};
use crate::middleware::{BearerToken, Lang};
use crate::services::RegistrationLookup;
use crate::state::{AppContext, CalendarMonthView, CalendarViewState};
use crate::utils::errors::Result;
use crate::utils::helpers::parse_calendar_date;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarQuery {
    year: Option<i32>,
    month: Option<u32>,
    #[serde(default)]
    registered_only: bool,
    /// Comma-separated category names
    categories: Option<String>,
    day: Option<String>,
}

impl CalendarQuery {
    /// View state described by the query; missing year or month means the current one
    fn view_state(&self) -> Result<CalendarViewState> {
        let today = Utc::now().date_naive();
        let mut state = match (self.year, self.month) {
            (None, None) => CalendarViewState::for_today(today),
            (year, month) => CalendarViewState::new(
                year.unwrap_or_else(|| CalendarViewState::for_today(today).year()),
                month.unwrap_or_else(|| CalendarViewState::for_today(today).month()),
            )?,
        };

        state.set_registered_only(self.registered_only);
        for category in self
            .categories
            .iter()
            .flat_map(|c| c.split(','))
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            state.toggle_category(category);
        }
        if let Some(day) = self.day.as_deref().and_then(parse_calendar_date) {
            state.select_day(day);
        }
        Ok(state)
    }
}

/// A failed listing counts as empty
async fn tolerant<T>(listing: impl Future<Output = Result<Vec<T>>>, label: &str) -> Result<Vec<T>> {
    Ok(listing.await.unwrap_or_else(|e| {
        warn!(listing = label, error = %e, "Registration listing unavailable, treating as empty");
        Vec::new()
    }))
}

/// GET /api/calendar?year=&month=&registeredOnly=&categories=a,b&day=
pub async fn month(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Query(query): Query<CalendarQuery>,
) -> std::result::Result<Json<CalendarMonthView>, ApiError> {
    let state = query.view_state().localized(&ctx, &lang)?;

    let session = ctx.services.backend.session(&token);
    let (events, my_events, my_activities) = futures::try_join!(
        session.list_events(),
        tolerant(session.my_events(), "my-events"),
        tolerant(session.my_activities(), "my-activities"),
    )
    .localized(&ctx, &lang)?;

    let lookup = RegistrationLookup::from_listings(&my_events, &my_activities);
    let view = state
        .render(&ctx.services.calendar, &events, &lookup)
        .localized(&ctx, &lang)?;

    debug!(
        year = view.year,
        month = view.month,
        items = view.items.len(),
        "Calendar rendered"
    );
    Ok(Json(view))
}
