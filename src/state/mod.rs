//! State management module
//!
//! This module holds the application context shared by handlers and the
//! explicit view state of the calendar and event detail pages.

pub mod calendar_view;
pub mod context;
pub mod event_view;
pub mod guard;

// Re-export commonly used state components
pub use calendar_view::{CalendarMonthView, CalendarViewState};
pub use context::AppContext;
pub use event_view::{EventView, EventViewModel, PendingChange};
pub use guard::{ActionGuard, ActionTicket, Generation, ViewGeneration};
