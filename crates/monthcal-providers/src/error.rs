//! Error types for the OAuth flow and calendar access.
//!
//! Each stage of the flow has its own error type so callers can route
//! failures to the right user-facing state:
//!
//! - [`ConfigError`]: credentials missing or malformed, fatal at startup
//! - [`AuthError`]: code exchange or state verification failed, user logs in again
//! - [`FetchError`]: the calendar could not be read, re-authenticate or retry
//! - [`NormalizeError`]: one event's start value is unreadable, isolated per item

use std::fmt;
use thiserror::Error;

/// The category of an error, for logs and response mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Credentials file missing or invalid.
    ConfigurationError,
    /// The provider rejected the authorization code.
    ExchangeFailed,
    /// The callback state did not match the issued one.
    StateMismatch,
    /// Token absent, expired or rejected by the provider.
    Unauthenticated,
    /// Any other provider-side failure.
    ServiceError,
    /// An event start value could not be parsed.
    InvalidEventDate,
}

impl ErrorCode {
    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "configuration_error",
            Self::ExchangeFailed => "exchange_failed",
            Self::StateMismatch => "state_mismatch",
            Self::Unauthenticated => "unauthenticated",
            Self::ServiceError => "service_error",
            Self::InvalidEventDate => "invalid_event_date",
        }
    }

    /// Returns true if the user has to go through the login flow again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::ExchangeFailed | Self::StateMismatch | Self::Unauthenticated
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invalid or missing OAuth client credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The credentials file could not be read.
    #[error("failed to read credentials file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The credentials content is not valid JSON or lacks a client section.
    #[error("failed to parse client credentials: {0}")]
    Parse(String),

    /// A required field is empty or absent.
    #[error("missing {0} in client credentials")]
    MissingField(&'static str),

    /// An endpoint or redirect URI is not a valid absolute URL.
    #[error("invalid {field} URL '{value}': {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl ConfigError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns the error code.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ConfigurationError
    }
}

/// Failures of the authorization step.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The code could not be traded for a token. Codes are single-use, so
    /// this is never retried automatically.
    #[error("authorization code exchange failed: {reason}")]
    ExchangeFailed { reason: String },

    /// The callback `state` does not match the one issued with the
    /// authorization URL.
    #[error("OAuth state mismatch - possible CSRF attack")]
    StateMismatch,
}

impl AuthError {
    /// Creates an exchange failure.
    pub fn exchange_failed(reason: impl Into<String>) -> Self {
        Self::ExchangeFailed {
            reason: reason.into(),
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ExchangeFailed { .. } => ErrorCode::ExchangeFailed,
            Self::StateMismatch => ErrorCode::StateMismatch,
        }
    }
}

/// Failures while listing events.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Token missing, expired, or rejected (401) by the provider.
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// Network, quota, timeout, cancellation or malformed response.
    #[error("calendar service error: {0}")]
    ServiceError(String),
}

impl FetchError {
    /// Creates an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    /// Creates a service error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::ServiceError(message.into())
    }

    /// Returns the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthenticated(_) => ErrorCode::Unauthenticated,
            Self::ServiceError(_) => ErrorCode::ServiceError,
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated(message) | Self::ServiceError(message) => message,
        }
    }
}

/// An event start value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The value has a time component but is not RFC 3339.
    #[error("invalid date-time '{value}': {reason}")]
    InvalidDateTime { value: String, reason: String },

    /// The value is not a `YYYY-MM-DD` date.
    #[error("invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },
}

impl NormalizeError {
    /// Returns the error code.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidEventDate
    }

    /// Returns the rejected start value.
    pub fn value(&self) -> &str {
        match self {
            Self::InvalidDateTime { value, .. } | Self::InvalidDate { value, .. } => value,
        }
    }
}
