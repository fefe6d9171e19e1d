//! Event handlers
//!
//! Listing and CRUD are relayed to the backend. Registration goes through an
//! [`EventView`]: the snapshot is loaded, the change is recorded as pending,
//! the backend is asked, and the snapshot is fetched again so the answer is
//! always the backend's view of the registration.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::Response;
use axum::Json;
use futures::stream::{self, Stream};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{forward, ApiError, Localize};
use crate::middleware::{BearerToken, CurrentUser, Lang};
use crate::models::{CreateEventRequest, Event};
use crate::services::{
    reconcile, BackendSession, Permission, RegistrationState, RegistrationWatcher, WatcherHandle,
};
use crate::state::{AppContext, EventView, EventViewModel, PendingChange};
use crate::utils::errors::{EventusError, Result};
use crate::utils::logging::log_registration_change;

/// Parse and check an event body before it is relayed as-is
fn validate_event(body: &Value) -> Result<()> {
    let request: CreateEventRequest = serde_json::from_value(body.clone())
        .map_err(|e| EventusError::InvalidInput(e.to_string()))?;
    request.validate().map_err(EventusError::InvalidInput)
}

/// GET /api/events
pub async fn list(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
) -> std::result::Result<Response, ApiError> {
    forward(&ctx, &lang, &token, Method::GET, "/events", &[], None).await
}

/// GET /api/events/{id}
pub async fn get(
    State(ctx): State<AppContext>,
    Lang(lang): Lang,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> std::result::Result<Response, ApiError> {
    let path = format!("/events/{}", id);
    forward(&ctx, &lang, &token, Method::GET, &path, &[], None).await
}

/// POST /api/events - organizers only
pub async fn create(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Json(body): Json<Value>,
) -> std::result::Result<Response, ApiError> {
    user.auth.require(Permission::ManageEvents).localized(&ctx, &user.lang)?;
    validate_event(&body).localized(&ctx, &user.lang)?;

    forward(&ctx, &user.lang, &user.token, Method::POST, "/events", &[], Some(&body)).await
}

/// PUT /api/events/{id} - organizers only
pub async fn update(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> std::result::Result<Response, ApiError> {
    user.auth.require(Permission::ManageEvents).localized(&ctx, &user.lang)?;
    validate_event(&body).localized(&ctx, &user.lang)?;

    let path = format!("/events/{}", id);
    forward(&ctx, &user.lang, &user.token, Method::PUT, &path, &[], Some(&body)).await
}

/// DELETE /api/events/{id} - organizers only
pub async fn delete(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> std::result::Result<Response, ApiError> {
    user.auth.require(Permission::ManageEvents).localized(&ctx, &user.lang)?;

    let path = format!("/events/{}", id);
    forward(&ctx, &user.lang, &user.token, Method::DELETE, &path, &[], None).await
}

/// Fetch the event into `view` unless a newer load superseded this one
async fn load(view: &mut EventView, session: BackendSession<'_>, event_id: i64) -> Result<()> {
    let generation = view.begin_load();
    let event = session.get_event(event_id).await?;
    view.apply_snapshot(generation, event);
    Ok(())
}

/// GET /api/events/{id}/registration - the caller's registration state
pub async fn registration(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> std::result::Result<Json<EventViewModel>, ApiError> {
    let session = ctx.services.backend.session(&user.token);
    let mut view = EventView::new(user.subject_id());
    load(&mut view, session, id).await.localized(&ctx, &user.lang)?;
    Ok(Json(view.render()))
}

/// POST /api/events/{id}/register
pub async fn register(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> std::result::Result<Json<EventViewModel>, ApiError> {
    change_registration(&ctx, &user, id, PendingChange::RegisterEvent).await
}

/// DELETE /api/events/{id}/register
pub async fn cancel(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> std::result::Result<Json<EventViewModel>, ApiError> {
    change_registration(&ctx, &user, id, PendingChange::CancelEvent).await
}

async fn change_registration(
    ctx: &AppContext,
    user: &CurrentUser,
    event_id: i64,
    change: PendingChange,
) -> std::result::Result<Json<EventViewModel>, ApiError> {
    let lang = user.lang.as_str();
    let subject_id = user.subject_id();
    let registering = change == PendingChange::RegisterEvent;

    let action = if registering { "register" } else { "cancel" };
    let _ticket = ctx
        .actions
        .try_begin(format!("event:{}:{}:{}", action, event_id, subject_id))
        .localized(ctx, lang)?;

    let session = ctx.services.backend.session(&user.token);
    let mut view = EventView::new(subject_id);
    load(&mut view, session, event_id).await.localized(ctx, lang)?;

    let current = view.registration();
    if registering && current.event_registered {
        return Err(ApiError::message(
            ctx,
            lang,
            StatusCode::CONFLICT,
            "registration.already_registered",
            None,
        ));
    }
    let registration_id = match (registering, current.event_registration_id) {
        (true, _) => None,
        (false, Some(id)) => Some(id),
        (false, None) => {
            return Err(ApiError::new(
                ctx,
                lang,
                EventusError::InvalidInput(format!("not registered for event {}", event_id)),
            ))
        }
    };

    view.begin(change).localized(ctx, lang)?;
    debug!(event_id = event_id, subject_id = %subject_id, change = ?change, "Registration change pending");

    let outcome = match registration_id {
        None => session.register_for_event(event_id).await.map(|_| ()),
        Some(registration_id) => session.cancel_event_registration(registration_id).await,
    };
    if let Err(e) = outcome {
        view.fail(change);
        return Err(ApiError::new(ctx, lang, e));
    }
    log_registration_change(subject_id, "event", event_id, registering);

    load(&mut view, session, event_id).await.localized(ctx, lang)?;
    let rendered = view.render();
    if rendered.registration.event_registered != registering {
        info!(
            event_id = event_id,
            subject_id = %subject_id,
            "Backend snapshot disagrees with the requested change"
        );
    }
    Ok(Json(rendered))
}

/// GET /api/events/{id}/registration/watch - registration state as server-sent events
///
/// The current state is sent right away, then once per re-check interval.
/// The stream ends when the caller is no longer registered or disconnects.
/// A caller who is not registered gets a single frame and no watcher.
pub async fn watch_registration(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> std::result::Result<Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>>, ApiError>
{
    let subject_id = user.subject_id().to_string();
    let initial: Event = ctx
        .services
        .backend
        .session(&user.token)
        .get_event(id)
        .await
        .localized(&ctx, &user.lang)?;

    let (tx, rx) = mpsc::channel::<RegistrationState>(4);
    let state = reconcile(&initial, &subject_id);
    let registered = state.event_registered;
    let _ = tx.try_send(state);

    if !registered {
        // Dropping the only sender ends the stream after the first frame
        debug!(event_id = id, "Caller not registered, registration watch not started");
        drop(tx);
        return Ok(Sse::new(registration_frames(rx, None)).keep_alive(KeepAlive::default()));
    }

    let backend = ctx.services.backend.clone();
    let token = user.token.clone();
    let interval = Duration::from_secs(ctx.settings.session.recheck_interval_seconds);
    let handle = RegistrationWatcher::start(interval, move || {
        let backend = backend.clone();
        let token = token.clone();
        let subject_id = subject_id.clone();
        let tx = tx.clone();
        async move {
            let event = backend.session(&token).get_event(id).await?;
            let state = reconcile(&event, &subject_id);
            let registered = state.event_registered;
            if tx.send(state).await.is_err() {
                // Receiver gone: the client disconnected
                return Ok(false);
            }
            Ok(registered)
        }
    });

    Ok(Sse::new(registration_frames(rx, Some(handle))).keep_alive(KeepAlive::default()))
}

/// One `registration` frame per state; the watcher lives as long as the stream
fn registration_frames(
    rx: mpsc::Receiver<RegistrationState>,
    handle: Option<WatcherHandle>,
) -> impl Stream<Item = std::result::Result<SseEvent, Infallible>> {
    stream::unfold((rx, handle), |(mut rx, handle)| async move {
        let state = rx.recv().await?;
        let event = SseEvent::default()
            .event("registration")
            .json_data(&state)
            .unwrap_or_else(|_| SseEvent::default().event("registration"));
        Some((Ok(event), (rx, handle)))
    })
}
