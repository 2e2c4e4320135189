//! Authenticated fetch of the upcoming month of events.
//!
//! [`AuthenticatedFetcher`] computes the `[now, now + 1 month)` window,
//! rejects unusable tokens locally and bounds every provider call with a
//! timeout and an optional cancellation token.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use monthcal_core::{EventsView, TimeWindow};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::normalize::display_events;
use crate::provider::{CalendarService, EventQuery, PRIMARY_CALENDAR};
use crate::raw_event::RawEvent;
use crate::session::Token;

/// Default upper bound on one provider call.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Lists next-month events on behalf of an authenticated user.
#[derive(Clone)]
pub struct AuthenticatedFetcher {
    service: Arc<dyn CalendarService>,
    calendar_id: String,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl AuthenticatedFetcher {
    /// Creates a fetcher reading the primary calendar.
    pub fn new(service: Arc<dyn CalendarService>) -> Self {
        Self {
            service,
            calendar_id: PRIMARY_CALENDAR.to_string(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            cancel: None,
        }
    }

    /// Reads a different calendar.
    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Aborts in-flight fetches when `cancel` fires (e.g. on shutdown).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns the calendar this fetcher reads.
    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// Lists events starting in `[now, now + 1 month)`, in provider order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Unauthenticated`] without contacting the
    /// provider if the token is empty or expired at `now`, or when the
    /// provider rejects it. Timeouts, cancellation and every other provider
    /// failure are [`FetchError::ServiceError`].
    pub async fn fetch_upcoming_events(
        &self,
        token: &Token,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, FetchError> {
        if !token.is_usable_at(now) {
            debug!("token missing or expired, skipping provider call");
            return Err(FetchError::unauthenticated("token missing or expired"));
        }

        let window = TimeWindow::next_month(now)
            .ok_or_else(|| FetchError::service("time window out of range"))?;
        let query = EventQuery::upcoming(&self.calendar_id, window);

        debug!(
            service = self.service.name(),
            calendar = %self.calendar_id,
            start = %window.start,
            end = %window.end,
            days = window.duration().num_days(),
            "listing events"
        );

        let call = tokio::time::timeout(self.timeout, self.service.list_events(token, query));
        let outcome = match &self.cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => {
                    info!("event fetch cancelled");
                    return Err(FetchError::service("request cancelled"));
                }
                outcome = call => outcome,
            },
            None => call.await,
        };

        match outcome {
            Ok(Ok(events)) => {
                debug!("received {} events", events.len());
                Ok(events)
            }
            Ok(Err(e)) => {
                warn!(code = %e.code(), "event fetch failed: {}", e);
                Err(e)
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "event fetch timed out");
                Err(FetchError::service("request timeout"))
            }
        }
    }

    /// Fetches and normalizes events into the view the events page renders.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_upcoming_events`](Self::fetch_upcoming_events).
    pub async fn upcoming_view(
        &self,
        token: &Token,
        now: DateTime<Utc>,
    ) -> Result<EventsView, FetchError> {
        let raw = self.fetch_upcoming_events(token, now).await?;
        Ok(EventsView::from_events(display_events(&raw)))
    }
}

impl std::fmt::Debug for AuthenticatedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedFetcher")
            .field("service", &self.service.name())
            .field("calendar_id", &self.calendar_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}
