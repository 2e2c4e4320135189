//! Cookie-backed session storage.
//!
//! Two cookies carry the per-user state between requests:
//!
//! - `calendar_token`: the access token and its expiry, written after a
//!   successful code exchange (HttpOnly, SameSite=Strict, expires with the token)
//! - `oauth_state`: the anti-CSRF state issued by `/auth` and consumed by
//!   `/callback` (HttpOnly, SameSite=Lax so it survives the provider redirect)
//!
//! The token cookie value is `<expiry unix seconds>.<access token>`.

use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::Response;
use chrono::{DateTime, Utc};
use cookie::time::{Duration as CookieDuration, OffsetDateTime};
use cookie::{Cookie, SameSite};
use monthcal_providers::google::StateToken;
use monthcal_providers::{SessionStore, Token};
use tracing::{debug, warn};

/// Name of the cookie holding the access token.
pub const TOKEN_COOKIE: &str = "calendar_token";

/// Name of the cookie holding the pending OAuth state.
pub const STATE_COOKIE: &str = "oauth_state";

/// How long a login attempt may take before its state expires.
const STATE_COOKIE_TTL_MINUTES: i64 = 10;

/// Returns the value of the named cookie from the request headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| Cookie::parse(pair.trim()).ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// Encodes a token as a cookie value.
pub(crate) fn encode_token(token: &Token) -> String {
    format!("{}.{}", token.expiry.timestamp(), token.access_token)
}

/// Decodes a cookie value written by [`encode_token`].
pub(crate) fn decode_token(value: &str) -> Option<Token> {
    let (expiry, access_token) = value.split_once('.')?;
    let expiry = DateTime::<Utc>::from_timestamp(expiry.parse().ok()?, 0)?;
    if access_token.is_empty() {
        return None;
    }
    Some(Token::new(access_token, expiry))
}

/// A [`SessionStore`] that reads the request's cookies and queues
/// `Set-Cookie` headers for the response.
#[derive(Debug)]
pub struct CookieSessionStore {
    token: Option<Token>,
    state: Option<String>,
    secure: bool,
    outgoing: Vec<Cookie<'static>>,
}

impl CookieSessionStore {
    /// Creates a store from the request headers.
    ///
    /// `secure` controls the `Secure` attribute of every cookie written.
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        let token = read_cookie(headers, TOKEN_COOKIE).and_then(|value| {
            let token = decode_token(&value);
            if token.is_none() {
                debug!("ignoring malformed {} cookie", TOKEN_COOKIE);
            }
            token
        });

        Self {
            token,
            state: read_cookie(headers, STATE_COOKIE),
            secure,
            outgoing: Vec::new(),
        }
    }

    /// Remembers a freshly issued OAuth state for the callback.
    pub fn set_state(&mut self, state: &StateToken) {
        let cookie = Cookie::build((STATE_COOKIE, state.as_str().to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(CookieDuration::minutes(STATE_COOKIE_TTL_MINUTES))
            .build();
        self.state = Some(state.as_str().to_string());
        self.outgoing.push(cookie);
    }

    /// Returns the pending OAuth state and queues its removal.
    ///
    /// A state is good for one callback only.
    pub fn take_state(&mut self) -> Option<StateToken> {
        let state = self.state.take()?;
        let removal = self.removal(STATE_COOKIE, SameSite::Lax);
        self.outgoing.push(removal);
        Some(StateToken::from_issued(state))
    }

    /// Appends the queued `Set-Cookie` headers to a response.
    pub fn apply(self, mut response: Response) -> Response {
        for cookie in self.outgoing {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!(cookie = cookie.name(), "invalid Set-Cookie value: {}", e),
            }
        }
        response
    }

    fn removal(&self, name: &'static str, same_site: SameSite) -> Cookie<'static> {
        let mut cookie = Cookie::build((name, ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(same_site)
            .path("/")
            .build();
        cookie.make_removal();
        cookie
    }
}

impl SessionStore for CookieSessionStore {
    fn load(&self) -> Option<Token> {
        self.token.clone()
    }

    fn store(&mut self, token: &Token) {
        let mut builder = Cookie::build((TOKEN_COOKIE, encode_token(token)))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/");
        match OffsetDateTime::from_unix_timestamp(token.expiry.timestamp()) {
            Ok(expires) => builder = builder.expires(expires),
            Err(e) => warn!("token expiry out of cookie range, using a session cookie: {}", e),
        }
        self.outgoing.push(builder.build());
        self.token = Some(token.clone());
    }

    fn clear(&mut self) {
        self.token = None;
        let removal = self.removal(TOKEN_COOKIE, SameSite::Strict);
        self.outgoing.push(removal);
    }
}
