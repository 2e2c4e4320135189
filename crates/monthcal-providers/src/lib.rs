//! OAuth flow, calendar access and event normalization.
//!
//! This crate provides everything between the browser-facing server and
//! the calendar provider:
//!
//! - [`google::OAuthConfig`] and [`google::OAuthClient`] - the authorization-code flow
//! - [`CalendarService`] - the trait a calendar backend implements
//! - [`AuthenticatedFetcher`] - next-month window, token checks, timeout and cancellation
//! - [`normalize_events`] - provider start values to display strings
//! - [`SessionStore`] - per-session token storage
//!
//! # Architecture
//!
//! ```text
//!   /callback ──► OAuthClient::exchange_code_for_token ──► Token ──► SessionStore
//!
//!   /events ──► SessionStore::load ──► AuthenticatedFetcher
//!                                            │
//!                                            ▼ CalendarService::list_events
//!                                      Vec<RawEvent>
//!                                            │
//!                                            ▼ normalize_events()
//!                                      EventsView
//! ```

pub mod error;
pub mod fetcher;
pub mod google;
pub mod normalize;
pub mod provider;
pub mod raw_event;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export main types at crate root
pub use error::{AuthError, ConfigError, ErrorCode, FetchError, NormalizeError};
pub use fetcher::{AuthenticatedFetcher, DEFAULT_FETCH_TIMEOUT};
pub use normalize::{Normalized, display_events, normalize_event, normalize_events};
pub use provider::{BoxFuture, CalendarService, EventQuery, OrderBy, PRIMARY_CALENDAR};
pub use raw_event::{RawEvent, StartKind};
pub use session::{DEFAULT_TOKEN_LIFETIME_SECS, SessionStore, Token};
