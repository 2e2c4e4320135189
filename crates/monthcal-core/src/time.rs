//! Time windows for calendar queries.
//!
//! [`TimeWindow`] is a half-open `[start, end)` interval in UTC. The upcoming
//! events view always asks for [`TimeWindow::next_month`], which advances by
//! calendar months rather than a fixed number of days.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates the window `[now, now + 1 calendar month)`.
    ///
    /// Returns `None` only when the end falls outside chrono's date range.
    pub fn next_month(now: DateTime<Utc>) -> Option<Self> {
        let end = add_calendar_months(now, 1)?;
        Some(Self::new(now, end))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Adds whole calendar months to a UTC datetime, keeping the time of day.
///
/// Day-of-month overflow rolls into the following month, so January 31st
/// plus one month is March 3rd (March 2nd in leap years), never a clamped
/// February 28th.
pub fn add_calendar_months(dt: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    let month0 = dt.month0().checked_add(months)?;
    let year = dt.year().checked_add(i32::try_from(month0 / 12).ok()?)?;
    let first = NaiveDate::from_ymd_opt(year, month0 % 12 + 1, 1)?;
    let date = first.checked_add_days(Days::new(u64::from(dt.day0())))?;
    Some(date.and_time(dt.time()).and_utc())
}
