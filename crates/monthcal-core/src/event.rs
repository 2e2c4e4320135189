//! Display types for calendar events.
//!
//! - [`DisplayEvent`]: a `(date, summary)` pair ready for presentation
//! - [`EventsView`]: the events page model, with an explicit empty state

use serde::{Deserialize, Serialize};

/// Date text shown for an event whose start value could not be parsed.
pub const INVALID_DATE: &str = "----/--/--";

/// A display-ready calendar event.
///
/// The date is already formatted: `YYYY/MM/DD HH:MM` for timed events,
/// `YYYY/MM/DD` for all-day events, or [`INVALID_DATE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEvent {
    /// Formatted start date.
    pub date: String,
    /// Event title.
    pub summary: String,
}

impl DisplayEvent {
    /// Creates a new display event.
    pub fn new(date: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            summary: summary.into(),
        }
    }

    /// Creates an event carrying the [`INVALID_DATE`] sentinel.
    pub fn with_invalid_date(summary: impl Into<String>) -> Self {
        Self::new(INVALID_DATE, summary)
    }

    /// Returns true if the date is the [`INVALID_DATE`] sentinel.
    pub fn has_invalid_date(&self) -> bool {
        self.date == INVALID_DATE
    }
}

/// What the events page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "events", rename_all = "snake_case")]
pub enum EventsView {
    /// No events in the window. Not an error.
    Empty,
    /// Events ordered by start time.
    Events(Vec<DisplayEvent>),
}

impl EventsView {
    /// Builds a view, mapping an empty list to [`EventsView::Empty`].
    pub fn from_events(events: Vec<DisplayEvent>) -> Self {
        if events.is_empty() {
            Self::Empty
        } else {
            Self::Events(events)
        }
    }

    /// Returns true for the empty state.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the events, or an empty slice for the empty state.
    pub fn events(&self) -> &[DisplayEvent] {
        match self {
            Self::Empty => &[],
            Self::Events(events) => events,
        }
    }
}
