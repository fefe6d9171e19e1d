//! Event plan handlers

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{document_response, forward, ApiError, Localize};
use crate::middleware::{BearerToken, Lang};
use crate::services::EventPlanReport;
use crate::state::AppContext;

#[derive(Debug, Deserialize)]
pub struct PlanListQuery {
    page: Option<u32>,
    size: Option<u32>,
    search: Option<String>,
}

/// Name and event date are the two fields a plan cannot do without
fn is_complete(plan: &Value) -> bool {
    ["name", "eventDate"].iter().all(|field| match plan.get(*field) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    })
}

fn reject_incomplete(ctx: &AppContext, lang: &str, plan: &Value) -> Result<(), ApiError> {
    if is_complete(plan) {
        Ok(())
    } else {
        Err(ApiError::message(ctx, lang, StatusCode::BAD_REQUEST, "plans.incomplete", None))
    }
}

/// GET /api/event-plans - paged listing with optional search
pub async fn list(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Query(query): Query<PlanListQuery>,
) -> Result<Response, ApiError> {
    let mut params = vec![
        ("page", query.page.unwrap_or(0).to_string()),
        ("size", query.size.unwrap_or(10).to_string()),
    ];
    if let Some(search) = query.search.filter(|s| !s.is_empty()) {
        params.push(("search", search));
    }

    forward(&ctx, &lang, &token, Method::GET, "/event-plans", &params, None).await
}

/// POST /api/event-plans
pub async fn create(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Json(plan): Json<Value>,
) -> Result<Response, ApiError> {
    reject_incomplete(&ctx, &lang, &plan)?;
    forward(&ctx, &lang, &token, Method::POST, "/event-plans", &[], Some(&plan)).await
}

/// GET /api/event-plans/{id}
pub async fn get(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let path = format!("/event-plans/{}", id);
    forward(&ctx, &lang, &token, Method::GET, &path, &[], None).await
}

/// PUT /api/event-plans/{id}
pub async fn update(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
    Json(plan): Json<Value>,
) -> Result<Response, ApiError> {
    reject_incomplete(&ctx, &lang, &plan)?;
    let path = format!("/event-plans/{}", id);
    forward(&ctx, &lang, &token, Method::PUT, &path, &[], Some(&plan)).await
}

/// DELETE /api/event-plans/{id} - 204 on success
pub async fn delete(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    debug!(plan_id = id, "Deleting event plan");
    let path = format!("/event-plans/{}", id);
    let response = ctx
        .services
        .backend
        .forward(&token, Method::DELETE, &path, &[], None)
        .await
        .localized(&ctx, &lang)?;

    if response.status.is_success() {
        info!(plan_id = id, "Event plan deleted");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(super::proxy_response(response))
}

/// GET /api/event-plans/{id}/report - planning sheet download
pub async fn report(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let plan = ctx
        .services
        .backend
        .session(&token)
        .get_event_plan(id)
        .await
        .localized(&ctx, &lang)?;

    let report = EventPlanReport::new(&plan, Utc::now());
    Ok(document_response(report.render()))
}
