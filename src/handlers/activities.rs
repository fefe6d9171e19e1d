//! Activity handlers: CRUD relay, registration and attendance views

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{document_response, forward, ApiError, Localize};
use crate::middleware::{BearerToken, CurrentUser, Lang};
use crate::models::{Activity, CreateActivityRequest};
use crate::services::{
    AttendanceReport, AttendanceRoster, CsvRenderer, Participant, Permission, ReportRenderer,
    TextRenderer,
};
use crate::state::AppContext;
use crate::utils::errors::{EventusError, Result};
use crate::utils::helpers::normalize_whitespace;
use crate::utils::logging::log_registration_change;

#[derive(Debug, Deserialize)]
pub struct CreateActivityQuery {
    #[serde(rename = "eventId")]
    event_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

impl AttendanceQuery {
    fn needle(&self) -> String {
        self.q.as_deref().map(normalize_whitespace).unwrap_or_default()
    }
}

/// Roster of one activity as shown to organizers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceView {
    pub activity_id: i64,
    pub activity_name: String,
    pub activity_date: Option<NaiveDate>,
    pub participants: Vec<Participant>,
    pub total: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub present_label: String,
    pub absent_label: String,
}

fn renderer_for(format: Option<&str>) -> Result<Box<dyn ReportRenderer>> {
    match format.unwrap_or("csv") {
        "csv" => Ok(Box::new(CsvRenderer)),
        "text" | "txt" => Ok(Box::new(TextRenderer)),
        other => Err(EventusError::InvalidInput(format!("unknown report format: {}", other))),
    }
}

/// GET /api/activities/{id}
pub async fn get(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> std::result::Result<Response, ApiError> {
    let path = format!("/activities/{}", id);
    forward(&ctx, &lang, &token, Method::GET, &path, &[], None).await
}

/// POST /api/activities?eventId= - organizers only
pub async fn create(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Query(query): Query<CreateActivityQuery>,
    Json(body): Json<Value>,
) -> std::result::Result<Response, ApiError> {
    user.auth.require(Permission::ManageEvents).localized(&ctx, &user.lang)?;

    let request: CreateActivityRequest = serde_json::from_value(body.clone())
        .map_err(|e| EventusError::InvalidInput(e.to_string()))
        .localized(&ctx, &user.lang)?;
    request
        .validate()
        .map_err(EventusError::InvalidInput)
        .localized(&ctx, &user.lang)?;

    let params = [("eventId", query.event_id.to_string())];
    forward(&ctx, &user.lang, &user.token, Method::POST, "/activities", &params, Some(&body)).await
}

/// DELETE /api/activities/{id} - organizers only
pub async fn delete(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> std::result::Result<Response, ApiError> {
    user.auth.require(Permission::ManageEvents).localized(&ctx, &user.lang)?;

    let path = format!("/activities/{}", id);
    forward(&ctx, &user.lang, &user.token, Method::DELETE, &path, &[], None).await
}

/// POST /api/activities/{id}/register - returns the backend's answer
pub async fn register(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Value>, ApiError> {
    let _ticket = ctx
        .actions
        .try_begin(format!("activity:register:{}:{}", id, user.subject_id()))
        .localized(&ctx, &user.lang)?;

    let body = ctx
        .services
        .backend
        .session(&user.token)
        .register_for_activity(id)
        .await
        .localized(&ctx, &user.lang)?;
    log_registration_change(user.subject_id(), "activity", id, true);

    Ok(Json(body))
}

/// DELETE /api/activities/{id}/register - cancel the caller's registration
pub async fn cancel(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> std::result::Result<Response, ApiError> {
    let _ticket = ctx
        .actions
        .try_begin(format!("activity:cancel:{}:{}", id, user.subject_id()))
        .localized(&ctx, &user.lang)?;

    let session = ctx.services.backend.session(&user.token);
    let activity = session.get_activity(id).await.localized(&ctx, &user.lang)?;
    let registration_id = activity
        .registrations
        .iter()
        .find(|r| r.is_active_for(user.subject_id()))
        .map(|r| r.id)
        .ok_or_else(|| EventusError::InvalidInput(format!("not registered for activity {}", id)))
        .localized(&ctx, &user.lang)?;

    session
        .cancel_activity_registration(registration_id)
        .await
        .localized(&ctx, &user.lang)?;
    log_registration_change(user.subject_id(), "activity", id, false);

    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn load_roster(ctx: &AppContext, user: &CurrentUser, activity_id: i64) -> Result<(Activity, AttendanceRoster)> {
    let activity = ctx
        .services
        .backend
        .session(&user.token)
        .get_activity(activity_id)
        .await?;
    let roster = AttendanceRoster::from_activity(&activity);
    debug!(activity_id = activity_id, participants = roster.len(), "Roster loaded");
    Ok((activity, roster))
}

/// GET /api/activities/{id}/attendance?q= - organizers only
///
/// `participants` is filtered by `q`; the counts always cover the whole roster.
pub async fn attendance(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<AttendanceQuery>,
) -> std::result::Result<Json<AttendanceView>, ApiError> {
    user.auth.require(Permission::ManageAttendance).localized(&ctx, &user.lang)?;

    let (activity, roster) = load_roster(&ctx, &user, id).await.localized(&ctx, &user.lang)?;
    let present_count = roster.present_count();
    let absent_count = roster.absent_count();

    Ok(Json(AttendanceView {
        activity_id: activity.id,
        activity_name: activity.name.clone(),
        activity_date: activity.activity_date,
        participants: roster.filter(&query.needle()).into_iter().cloned().collect(),
        total: roster.len(),
        present_count,
        absent_count,
        present_label: ctx.i18n.tp("attendance.present_count", &user.lang, present_count as i64, None),
        absent_label: ctx.i18n.tp("attendance.absent_count", &user.lang, absent_count as i64, None),
    }))
}

/// GET /api/activities/{id}/attendance/report?format=csv|text&q=
pub async fn attendance_report(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<AttendanceQuery>,
) -> std::result::Result<Response, ApiError> {
    user.auth.require(Permission::ExportReports).localized(&ctx, &user.lang)?;
    let renderer = renderer_for(query.format.as_deref()).localized(&ctx, &user.lang)?;

    let (activity, roster) = load_roster(&ctx, &user, id).await.localized(&ctx, &user.lang)?;
    let participants = roster.filter(&query.needle());
    let report = AttendanceReport::build(&activity, &participants, Utc::now());

    let document = renderer.render(&report).localized(&ctx, &user.lang)?;
    Ok(document_response(document))
}
