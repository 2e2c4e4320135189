//! Google OAuth 2.0 and Calendar API support.
//!
//! # Authentication Flow
//!
//! 1. [`OAuthConfig`] is loaded from the credentials JSON at startup
//! 2. The user is sent to the consent page with a fresh [`StateToken`]
//! 3. Google redirects back to the configured redirect URI with a code
//! 4. [`OAuthClient`] exchanges the code for an access token
//! 5. [`GoogleCalendarClient`] lists events with that token
//!
//! Refresh tokens are not requested for storage; an expired access token
//! sends the user through the flow again.

mod client;
mod config;
mod oauth;

pub use client::{CALENDAR_API_BASE, GoogleCalendarClient};
pub use config::{CALENDAR_READONLY_SCOPE, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, OAuthConfig};
pub use oauth::{OAuthClient, StateToken};
