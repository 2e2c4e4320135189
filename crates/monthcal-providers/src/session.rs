//! Bearer tokens and the session store abstraction.
//!
//! A [`Token`] lives only as long as the user's session. The core never
//! persists it; a [`SessionStore`] implementation (a cookie jar in the web
//! server) carries it from the callback request to the events request.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// An OAuth bearer credential with its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// The opaque access token for API requests.
    pub access_token: String,
    /// When the access token stops being valid.
    pub expiry: DateTime<Utc>,
}

impl Token {
    /// Creates a token with an absolute expiry.
    pub fn new(access_token: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expiry,
        }
    }

    /// Creates a token from a token endpoint's relative `expires_in`.
    ///
    /// Returns `None` when `expires_in` is not positive or the resulting
    /// expiry is out of range.
    pub fn from_expires_in(
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let secs = expires_in_secs.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        if secs <= 0 {
            return None;
        }
        let expiry = now.checked_add_signed(Duration::try_seconds(secs)?)?;
        Some(Self::new(access_token, expiry))
    }

    /// Returns true if the token is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }

    /// Returns true if the token can be sent to the provider at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }
}

// The access token must never end up in logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Per-session storage for the current user's token.
///
/// Implementations decide the transport (cookie, header, in-memory) and
/// must mirror the token's expiry.
pub trait SessionStore {
    /// Returns the session's token, if one is present.
    fn load(&self) -> Option<Token>;

    /// Saves a token for the rest of the session.
    fn store(&mut self, token: &Token);

    /// Forgets the session's token.
    fn clear(&mut self);
}
