//! Attendance roster
//!
//! Builds the participant list of one activity from its registrations and
//! tracks presence toggles. A toggle is two-phase: [`AttendanceRoster::begin_toggle`]
//! marks the participant as loading, the update goes out through a
//! [`PresenceUpdater`], and [`AttendanceRoster::complete_toggle`] applies the
//! outcome. A failed update leaves `present` as it was.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::Activity;
use crate::utils::errors::{EventusError, Result, ToggleError};
use crate::utils::logging::log_attendance_change;

/// Registered participant of an activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Registration id
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub email: String,
    pub present: bool,
    pub loading: bool,
}

impl Participant {
    fn matches(&self, needle: &str) -> bool {
        self.user_name.to_lowercase().contains(needle) || self.email.to_lowercase().contains(needle)
    }
}

/// Sends presence changes to whoever stores them
#[async_trait]
pub trait PresenceUpdater: Send + Sync {
    async fn set_presence(&self, activity_id: i64, user_id: &str, present: bool) -> Result<()>;
}

/// A toggle that has been started and not yet completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub activity_id: i64,
    pub participant_id: i64,
    pub user_id: String,
    pub new_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRoster {
    activity_id: i64,
    participants: Vec<Participant>,
}

impl AttendanceRoster {
    pub fn from_activity(activity: &Activity) -> Self {
        let participants = activity
            .registrations
            .iter()
            .map(|reg| Participant {
                id: reg.id,
                user_id: reg.user_id.clone(),
                user_name: reg.user_name.clone().unwrap_or_default(),
                email: reg.email.clone().unwrap_or_default(),
                present: reg.present.unwrap_or(false),
                loading: false,
            })
            .collect();

        Self {
            activity_id: activity.id,
            participants,
        }
    }

    pub fn activity_id(&self) -> i64 {
        self.activity_id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn present_count(&self) -> usize {
        self.participants.iter().filter(|p| p.present).count()
    }

    pub fn absent_count(&self) -> usize {
        self.len() - self.present_count()
    }

    /// Case-insensitive match on name or email; a blank query keeps everyone
    pub fn filter(&self, query: &str) -> Vec<&Participant> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.participants.iter().collect();
        }
        self.participants.iter().filter(|p| p.matches(&needle)).collect()
    }

    pub fn participant(&self, participant_id: i64) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn participant_for_user(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    fn participant_mut(&mut self, participant_id: i64) -> std::result::Result<&mut Participant, ToggleError> {
        self.participants
            .iter_mut()
            .find(|p| p.id == participant_id)
            .ok_or(ToggleError::UnknownParticipant(participant_id))
    }

    /// Mark the participant as loading; rejected while another toggle is in flight
    pub fn begin_toggle(
        &mut self,
        participant_id: i64,
        new_present: bool,
    ) -> std::result::Result<PendingToggle, ToggleError> {
        let activity_id = self.activity_id;
        let participant = self.participant_mut(participant_id)?;
        if participant.loading {
            return Err(ToggleError::InFlight(participant_id));
        }
        participant.loading = true;

        Ok(PendingToggle {
            activity_id,
            participant_id,
            user_id: participant.user_id.clone(),
            new_present,
        })
    }

    /// Apply the outcome of an update started with [`Self::begin_toggle`]
    pub fn complete_toggle(
        &mut self,
        pending: &PendingToggle,
        outcome: std::result::Result<(), String>,
    ) -> std::result::Result<Participant, ToggleError> {
        let participant = self.participant_mut(pending.participant_id)?;
        participant.loading = false;

        match outcome {
            Ok(()) => {
                participant.present = pending.new_present;
                Ok(participant.clone())
            }
            Err(reason) => Err(ToggleError::Rejected(reason)),
        }
    }
}

/// A roster shared between concurrent toggles
///
/// The lock is held only while the roster itself changes; the update call
/// runs unlocked so toggles on different participants overlap.
#[derive(Debug)]
pub struct AttendanceBoard {
    roster: Mutex<AttendanceRoster>,
}

impl AttendanceBoard {
    pub fn new(roster: AttendanceRoster) -> Self {
        Self {
            roster: Mutex::new(roster),
        }
    }

    /// Copy of the current roster
    pub async fn snapshot(&self) -> AttendanceRoster {
        self.roster.lock().await.clone()
    }

    /// Run a full toggle for `participant_id` through `updater`
    pub async fn toggle(
        &self,
        updater: &dyn PresenceUpdater,
        participant_id: i64,
        new_present: bool,
    ) -> Result<Participant> {
        let pending = self.roster.lock().await.begin_toggle(participant_id, new_present)?;

        debug!(
            activity_id = pending.activity_id,
            participant_id = participant_id,
            present = new_present,
            "Presence update started"
        );

        let outcome = updater
            .set_presence(pending.activity_id, &pending.user_id, new_present)
            .await
            .map_err(|e| e.to_string());
        log_attendance_change(pending.activity_id, &pending.user_id, new_present, outcome.is_ok());

        self.roster
            .lock()
            .await
            .complete_toggle(&pending, outcome)
            .map_err(EventusError::from)
    }

    /// Toggle by user id, as addressed by the attendance route
    pub async fn toggle_user(
        &self,
        updater: &dyn PresenceUpdater,
        user_id: &str,
        new_present: bool,
    ) -> Result<Participant> {
        let participant_id = self
            .roster
            .lock()
            .await
            .participant_for_user(user_id)
            .map(|p| p.id)
            .ok_or_else(|| EventusError::InvalidInput(format!("user {} is not registered", user_id)))?;
        self.toggle(updater, participant_id, new_present).await
    }
}
