//! Google Calendar API client.
//!
//! Implements [`CalendarService`] against the Calendar API v3 `events.list`
//! endpoint with bearer authentication.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ConfigError, FetchError};
use crate::provider::{BoxFuture, CalendarService, EventQuery};
use crate::raw_event::RawEvent;
use crate::session::Token;

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl GoogleCalendarClient {
    /// Creates a new client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http_client,
            api_base: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Points the client at a different API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the events.list URL for a calendar.
    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        )
    }

    /// Lists one page of events; pagination is not followed.
    async fn list_events_impl(
        &self,
        token: &Token,
        query: &EventQuery,
    ) -> Result<Vec<RawEvent>, FetchError> {
        let url = self.events_url(&query.calendar_id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token.access_token)
            .query(&[
                ("timeMin", query.window.start.to_rfc3339()),
                ("timeMax", query.window.end.to_rfc3339()),
                ("singleEvents", query.single_events.to_string()),
                ("orderBy", query.order_by.as_str().to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::service("request timeout")
                } else if e.is_connect() {
                    FetchError::service(format!("connection failed: {}", e))
                } else {
                    FetchError::service(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::unauthenticated(
                "access token expired or invalid",
            ));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::service("rate limit exceeded"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "calendar API error: {}", body);
            return Err(FetchError::service(format!("API error ({})", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::service(format!("failed to read response: {}", e)))?;

        let list: EventListResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::service(format!("failed to parse response: {}", e)))?;

        if list.next_page_token.is_some() {
            debug!("more events available than one page; only the first page is shown");
        }

        let events: Vec<RawEvent> = list.items.into_iter().map(convert_event).collect();
        debug!(
            "fetched {} events from calendar {}",
            events.len(),
            query.calendar_id
        );
        Ok(events)
    }
}

impl CalendarService for GoogleCalendarClient {
    fn name(&self) -> &str {
        "google"
    }

    fn list_events<'a>(
        &'a self,
        token: &'a Token,
        query: EventQuery,
    ) -> BoxFuture<'a, Result<Vec<RawEvent>, FetchError>> {
        Box::pin(async move { self.list_events_impl(token, &query).await })
    }
}

/// Converts an API event, keeping items without a start so the normalizer
/// can flag them instead of silently dropping them.
fn convert_event(event: ApiEvent) -> RawEvent {
    let (date_time, date) = match event.start {
        Some(start) => (start.date_time, start.date),
        None => {
            warn!(id = ?event.id, "event has no start time");
            (None, None)
        }
    };
    RawEvent::from_start_fields(date_time, date, event.summary)
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    start: Option<ApiEventTime>,
}

/// Event time from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}
