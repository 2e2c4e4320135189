//! CalendarService trait definition.
//!
//! [`CalendarService`] is the seam between the fetcher and a concrete
//! calendar API. The contract: list the events whose start falls in
//! `[window.start, window.end)`, expanding recurring events into single
//! instances and ordering them by start time.

use std::future::Future;
use std::pin::Pin;

use monthcal_core::TimeWindow;

use crate::error::FetchError;
use crate::raw_event::RawEvent;
use crate::session::Token;

/// Calendar queried when none is configured.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Sort order requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    /// Ascending by start time (requires single-instance expansion).
    #[default]
    StartTime,
}

impl OrderBy {
    /// Returns the query parameter value for this order.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartTime => "startTime",
        }
    }
}

/// A list-events request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Calendar to read.
    pub calendar_id: String,
    /// Window the event starts must fall in.
    pub window: TimeWindow,
    /// Expand recurring events into instances.
    pub single_events: bool,
    /// Result ordering.
    pub order_by: OrderBy,
}

impl EventQuery {
    /// Creates the standard upcoming-events query: single instances, by start time.
    pub fn upcoming(calendar_id: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            window,
            single_events: true,
            order_by: OrderBy::StartTime,
        }
    }
}

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so services can be shared as
/// `Arc<dyn CalendarService>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An opaque calendar API that can list events.
///
/// # Errors
///
/// Implementations return [`FetchError::Unauthenticated`] when the provider
/// rejects the token and [`FetchError::ServiceError`] for everything else.
pub trait CalendarService: Send + Sync {
    /// Returns the service name for logs (e.g. "google").
    fn name(&self) -> &str;

    /// Lists events matching the query, in provider order.
    fn list_events<'a>(
        &'a self,
        token: &'a Token,
        query: EventQuery,
    ) -> BoxFuture<'a, Result<Vec<RawEvent>, FetchError>>;
}
