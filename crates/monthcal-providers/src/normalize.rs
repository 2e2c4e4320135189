//! RawEvent to DisplayEvent conversion.
//!
//! Timed starts are rendered as `YYYY/MM/DD HH:MM` in the offset the
//! provider returned (no timezone conversion). All-day starts are rendered
//! as `YYYY/MM/DD`. A start value that fails to parse never aborts the
//! batch: the item is kept with the [`INVALID_DATE`] sentinel and the
//! failure is reported alongside it.

use chrono::{DateTime, NaiveDate};
use monthcal_core::{DisplayEvent, INVALID_DATE};
use tracing::warn;

use crate::error::NormalizeError;
use crate::raw_event::{RawEvent, StartKind};

const TIMED_FORMAT: &str = "%Y/%m/%d %H:%M";
const ALL_DAY_FORMAT: &str = "%Y/%m/%d";
const PROVIDER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-item outcome of [`normalize_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The start value parsed normally.
    Parsed(DisplayEvent),
    /// The start value was unreadable; `event.date` is [`INVALID_DATE`].
    Fallback {
        event: DisplayEvent,
        error: NormalizeError,
    },
}

impl Normalized {
    /// Returns the display event regardless of outcome.
    pub fn event(&self) -> &DisplayEvent {
        match self {
            Self::Parsed(event) | Self::Fallback { event, .. } => event,
        }
    }

    /// Consumes the outcome, returning the display event.
    pub fn into_event(self) -> DisplayEvent {
        match self {
            Self::Parsed(event) | Self::Fallback { event, .. } => event,
        }
    }

    /// Returns true if the sentinel date was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Returns the parse error for fallback items.
    pub fn error(&self) -> Option<&NormalizeError> {
        match self {
            Self::Parsed(_) => None,
            Self::Fallback { error, .. } => Some(error),
        }
    }
}

/// Converts a single [`RawEvent`] to a [`DisplayEvent`].
///
/// # Errors
///
/// Returns [`NormalizeError`] if the start value does not parse for its kind.
pub fn normalize_event(raw: &RawEvent) -> Result<DisplayEvent, NormalizeError> {
    let date = match raw.start_kind() {
        StartKind::Timed => format_timed(&raw.start)?,
        StartKind::AllDay => format_all_day(&raw.start)?,
    };
    Ok(DisplayEvent::new(date, &raw.summary))
}

/// Normalizes a batch, one output per input in the same order.
pub fn normalize_events(raw: &[RawEvent]) -> Vec<Normalized> {
    raw.iter()
        .map(|event| match normalize_event(event) {
            Ok(display) => Normalized::Parsed(display),
            Err(error) => {
                warn!(summary = %event.summary, "unreadable event start: {}", error);
                Normalized::Fallback {
                    event: DisplayEvent::with_invalid_date(&event.summary),
                    error,
                }
            }
        })
        .collect()
}

/// Normalizes a batch and drops the per-item outcome.
pub fn display_events(raw: &[RawEvent]) -> Vec<DisplayEvent> {
    normalize_events(raw)
        .into_iter()
        .map(Normalized::into_event)
        .collect()
}

fn format_timed(value: &str) -> Result<String, NormalizeError> {
    let parsed =
        DateTime::parse_from_rfc3339(value).map_err(|e| NormalizeError::InvalidDateTime {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    Ok(parsed.format(TIMED_FORMAT).to_string())
}

fn format_all_day(value: &str) -> Result<String, NormalizeError> {
    let parsed = NaiveDate::parse_from_str(value, PROVIDER_DATE_FORMAT).map_err(|e| {
        NormalizeError::InvalidDate {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(parsed.format(ALL_DAY_FORMAT).to_string())
}
