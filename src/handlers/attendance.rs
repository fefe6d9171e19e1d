//! Presence toggle handler

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::{ApiError, Localize};
use crate::middleware::CurrentUser;
use crate::services::{AttendanceBoard, AttendanceRoster, Participant, Permission};
use crate::state::AppContext;

#[derive(Debug, Deserialize)]
pub struct PresenceQuery {
    present: bool,
}

/// POST /api/attendance/{activity_id}/{user_id}?present= - organizers only
///
/// The roster is loaded fresh, the participant is toggled through the
/// backend and the updated participant is returned. A refused update
/// leaves presence as the backend had it.
pub async fn set_presence(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path((activity_id, user_id)): Path<(i64, String)>,
    Query(query): Query<PresenceQuery>,
) -> Result<Json<Participant>, ApiError> {
    user.auth.require(Permission::ManageAttendance).localized(&ctx, &user.lang)?;

    let session = ctx.services.backend.session(&user.token);
    let activity = session.get_activity(activity_id).await.localized(&ctx, &user.lang)?;
    let board = AttendanceBoard::new(AttendanceRoster::from_activity(&activity));

    let participant = board
        .toggle_user(&session, &user_id, query.present)
        .await
        .localized(&ctx, &user.lang)?;

    Ok(Json(participant))
}
