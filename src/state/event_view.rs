//! Event detail view state
//!
//! Holds the last authoritative event snapshot together with an overlay of
//! changes the caller started but the backend has not confirmed yet. The
//! overlay shapes what is shown while a change is pending; the next applied
//! snapshot discards it, and on disagreement the snapshot wins.

use serde::Serialize;
use tracing::debug;

use crate::models::Event;
use crate::services::registration::{reconcile, RegistrationState};
use crate::state::guard::{Generation, ViewGeneration};
use crate::utils::errors::{EventusError, Result};

/// A registration change awaiting confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "activityId", rename_all = "camelCase")]
pub enum PendingChange {
    RegisterEvent,
    CancelEvent,
    RegisterActivity(i64),
    CancelActivity(i64),
}

impl PendingChange {
    fn conflicts_with(&self, other: &PendingChange) -> bool {
        use PendingChange::*;
        match (self, other) {
            (RegisterEvent | CancelEvent, RegisterEvent | CancelEvent) => true,
            (RegisterActivity(a) | CancelActivity(a), RegisterActivity(b) | CancelActivity(b)) => a == b,
            _ => false,
        }
    }
}

/// What an event detail page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventViewModel {
    pub event: Option<Event>,
    pub registration: RegistrationState,
    pub pending: Vec<PendingChange>,
}

#[derive(Debug)]
pub struct EventView {
    subject_id: String,
    generation: ViewGeneration,
    snapshot: Option<Event>,
    pending: Vec<PendingChange>,
}

impl EventView {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            generation: ViewGeneration::new(),
            snapshot: None,
            pending: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> Option<&Event> {
        self.snapshot.as_ref()
    }

    /// Start a (re)load; its result is applied only if no later load or teardown happened
    pub fn begin_load(&self) -> Generation {
        self.generation.bump()
    }

    /// Apply a fetched snapshot; returns false when the result is stale
    pub fn apply_snapshot(&mut self, generation: Generation, event: Event) -> bool {
        if !self.generation.is_current(generation) {
            debug!(event_id = event.id, "Discarding stale event snapshot");
            return false;
        }
        self.snapshot = Some(event);
        self.pending.clear();
        true
    }

    /// Record a change as pending; refused while a conflicting one is pending
    pub fn begin(&mut self, change: PendingChange) -> Result<()> {
        if self.pending.iter().any(|p| p.conflicts_with(&change)) {
            return Err(EventusError::Busy(format!("{:?}", change)));
        }
        self.pending.push(change);
        Ok(())
    }

    /// Drop a pending change the backend refused
    pub fn fail(&mut self, change: PendingChange) {
        self.pending.retain(|p| *p != change);
    }

    /// Invalidate in-flight loads; nothing is applied after this
    pub fn teardown(&mut self) {
        self.generation.bump();
        self.pending.clear();
    }

    /// Snapshot inference with the pending overlay on top
    pub fn registration(&self) -> RegistrationState {
        let mut state = self
            .snapshot
            .as_ref()
            .map(|event| reconcile(event, &self.subject_id))
            .unwrap_or_default();

        for change in &self.pending {
            match *change {
                PendingChange::RegisterEvent => state.event_registered = true,
                PendingChange::CancelEvent => {
                    state.event_registered = false;
                    state.event_registration_id = None;
                }
                PendingChange::RegisterActivity(id) => {
                    state.registered_activity_ids.insert(id);
                }
                PendingChange::CancelActivity(id) => {
                    state.registered_activity_ids.remove(&id);
                    state.activity_registration_ids.remove(&id);
                }
            }
        }
        state
    }

    pub fn render(&self) -> EventViewModel {
        EventViewModel {
            event: self.snapshot.clone(),
            registration: self.registration(),
            pending: self.pending.clone(),
        }
    }
}
