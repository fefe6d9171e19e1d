//! Re-entrancy and staleness guards
//!
//! [`ActionGuard`] keeps at most one in-flight run per action key; a second
//! attempt while the first is running is refused instead of queued.
//! [`ViewGeneration`] lets a view drop results of requests started before a
//! reload or teardown.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::utils::errors::{EventusError, Result};

/// Set of action keys currently in flight
#[derive(Debug, Clone, Default)]
pub struct ActionGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ActionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`; the claim is released when the ticket drops
    pub fn try_begin(&self, key: impl Into<String>) -> Result<ActionTicket> {
        let key = key.into();
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| EventusError::Busy(key.clone()))?;
        if !in_flight.insert(key.clone()) {
            debug!(action = %key, "Action already in flight");
            return Err(EventusError::Busy(key));
        }
        Ok(ActionTicket {
            key,
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(key))
            .unwrap_or(false)
    }
}

/// Proof of a claimed action key
#[derive(Debug)]
pub struct ActionTicket {
    key: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ActionTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for ActionTicket {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.key);
        }
    }
}

/// Monotonic generation counter of one view
#[derive(Debug, Default)]
pub struct ViewGeneration {
    current: AtomicU64,
}

/// Generation captured when a request started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

impl ViewGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the generation a request belongs to
    pub fn capture(&self) -> Generation {
        Generation(self.current.load(Ordering::SeqCst))
    }

    /// Invalidate every captured generation, e.g. on reload or teardown
    pub fn bump(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether a result captured at `generation` may still be applied
    pub fn is_current(&self, generation: Generation) -> bool {
        self.capture() == generation
    }
}
