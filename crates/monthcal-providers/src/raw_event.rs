//! Raw event type from calendar providers.
//!
//! A [`RawEvent`] carries the start value exactly as the provider sent it.
//! Providers report timed events with an RFC 3339 date-time and all-day
//! events with a bare `YYYY-MM-DD` date; the normalizer tells them apart.

use serde::{Deserialize, Serialize};

/// How an event's start value is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartKind {
    /// A date-time with a time component (`2024-03-15T09:30:00Z`).
    Timed,
    /// A calendar date only (`2024-03-20`).
    AllDay,
}

/// A calendar event as returned by the provider, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// The start value, date-only or date-time.
    pub start: String,
    /// Event title (empty when the provider sent none).
    pub summary: String,
}

impl RawEvent {
    /// Creates a new raw event.
    pub fn new(start: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            summary: summary.into(),
        }
    }

    /// Builds an event from the provider's `{dateTime, date}` start pair.
    ///
    /// The date-time wins when both are set. When neither is set the start
    /// is left empty, which the normalizer reports as an invalid date.
    pub fn from_start_fields(
        date_time: Option<String>,
        date: Option<String>,
        summary: Option<String>,
    ) -> Self {
        let start = date_time
            .filter(|s| !s.is_empty())
            .or(date)
            .unwrap_or_default();
        Self::new(start, summary.unwrap_or_default())
    }

    /// Classifies the start value by the presence of the `T` separator.
    pub fn start_kind(&self) -> StartKind {
        if self.start.contains('T') {
            StartKind::Timed
        } else {
            StartKind::AllDay
        }
    }
}
