//! Registration reconciliation
//!
//! The backend owns registrations; this module only infers the caller's
//! status from what the backend returned. Two equivalent sources are
//! accepted: the registrations nested in an event snapshot, and the
//! caller's `my-events` / `my-activities` listings. Both produce the same
//! [`RegistrationState`], so nothing downstream cares which one was used.
//!
//! [`RegistrationWatcher`] re-runs a check on an interval for views that
//! keep showing a registration and stops once the check says it is gone.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::models::{Activity, Event};
use crate::utils::errors::Result;

/// The caller's registration status for one event and its activities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationState {
    pub event_registered: bool,
    pub event_registration_id: Option<i64>,
    pub registered_activity_ids: BTreeSet<i64>,
    /// Activity id to registration id, for cancelling
    pub activity_registration_ids: BTreeMap<i64, i64>,
}

impl RegistrationState {
    pub fn is_activity_registered(&self, activity_id: i64) -> bool {
        self.registered_activity_ids.contains(&activity_id)
    }

    /// Build the state from the caller's listings instead of the snapshot
    pub fn from_listings(
        event: &Event,
        subject_id: &str,
        my_events: &[Event],
        my_activities: &[Activity],
    ) -> Self {
        let listed_event = my_events.iter().find(|e| e.id == event.id);
        let event_registration_id = listed_event
            .into_iter()
            .flat_map(|e| e.registrations.iter())
            .chain(event.registrations.iter())
            .find(|r| r.is_active_for(subject_id))
            .map(|r| r.id);

        let mut state = RegistrationState {
            event_registered: listed_event.is_some(),
            event_registration_id: listed_event.and(event_registration_id),
            ..Default::default()
        };

        for activity in &event.activities {
            let Some(listed) = my_activities.iter().find(|a| a.id == activity.id) else {
                continue;
            };
            state.registered_activity_ids.insert(activity.id);
            if let Some(reg) = listed
                .registrations
                .iter()
                .chain(activity.registrations.iter())
                .find(|r| r.is_active_for(subject_id))
            {
                state.activity_registration_ids.insert(activity.id, reg.id);
            }
        }
        state
    }
}

/// Infer the caller's registration state from an event snapshot
///
/// Any active registration of `subject_id` wins. A registration without a
/// `registered` flag is not active. Empty lists mean not registered.
pub fn reconcile(event: &Event, subject_id: &str) -> RegistrationState {
    let event_registration = event
        .registrations
        .iter()
        .find(|r| r.is_active_for(subject_id));

    let mut state = RegistrationState {
        event_registered: event_registration.is_some(),
        event_registration_id: event_registration.map(|r| r.id),
        ..Default::default()
    };

    for activity in &event.activities {
        if let Some(reg) = activity
            .registrations
            .iter()
            .find(|r| r.is_active_for(subject_id))
        {
            state.registered_activity_ids.insert(activity.id);
            state.activity_registration_ids.insert(activity.id, reg.id);
        }
    }

    debug!(
        event_id = event.id,
        subject_id = %subject_id,
        event_registered = state.event_registered,
        activities = state.registered_activity_ids.len(),
        "Registration state reconciled"
    );
    state
}

/// Registration lookup across many events, used by the calendar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationLookup {
    events: HashSet<i64>,
    activities: HashSet<i64>,
}

impl RegistrationLookup {
    /// Build from the caller's listings
    pub fn from_listings(my_events: &[Event], my_activities: &[Activity]) -> Self {
        Self {
            events: my_events.iter().map(|e| e.id).collect(),
            activities: my_activities.iter().map(|a| a.id).collect(),
        }
    }

    /// Build by reconciling each snapshot for `subject_id`
    pub fn from_snapshots(events: &[Event], subject_id: &str) -> Self {
        let mut lookup = Self::default();
        for event in events {
            let state = reconcile(event, subject_id);
            if state.event_registered {
                lookup.events.insert(event.id);
            }
            lookup.activities.extend(state.registered_activity_ids);
        }
        lookup
    }

    pub fn is_event_registered(&self, event_id: i64) -> bool {
        self.events.contains(&event_id)
    }

    /// An activity counts as registered when listed itself or when its event is
    pub fn is_activity_registered(&self, event_id: i64, activity_id: i64) -> bool {
        self.activities.contains(&activity_id) || self.is_event_registered(event_id)
    }
}

/// Why a watcher stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// `stop()` was called
    Stopped,
    /// The check reported the registration is gone
    NoLongerRegistered,
}

/// Periodic registration re-check
pub struct RegistrationWatcher;

impl RegistrationWatcher {
    /// Spawn a task that runs `check` every `interval`
    ///
    /// The check answers "still registered?". Check errors are logged and the
    /// next tick runs as usual; there is no retry within a tick.
    pub fn start<F, Fut>(interval: Duration, mut check: F) -> WatcherHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        debug!("Registration watcher stopped");
                        return WatchExit::Stopped;
                    }
                    _ = ticker.tick() => {
                        match check().await {
                            Ok(true) => debug!("Registration still active"),
                            Ok(false) => {
                                info!("Registration no longer active, watcher exiting");
                                return WatchExit::NoLongerRegistered;
                            }
                            Err(e) => warn!(error = %e, "Registration re-check failed"),
                        }
                    }
                }
            }
        });

        WatcherHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running watcher; dropping it stops the task
pub struct WatcherHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<WatchExit>>,
}

impl WatcherHandle {
    /// Ask the task to stop; idempotent
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    /// Wait for the task to end and report why
    pub async fn join(mut self) -> WatchExit {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(WatchExit::Stopped),
            None => WatchExit::Stopped,
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
