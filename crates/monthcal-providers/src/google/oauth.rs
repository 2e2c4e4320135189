//! OAuth 2.0 authorization-code flow for Google APIs.
//!
//! # Flow Overview
//!
//! 1. Generate a random [`StateToken`] and remember it for the session
//! 2. Redirect the user to [`OAuthConfig::build_authorization_url`]
//! 3. The provider redirects back with `code` and `state`
//! 4. [`StateToken::verify`] the returned state
//! 5. [`OAuthClient::exchange_code_for_token`] trades the code for a [`Token`]
//!
//! Authorization codes are single-use, so a failed exchange is surfaced to
//! the user and never retried.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::Rng as _;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{AuthError, ConfigError};
use crate::session::Token;

use super::config::OAuthConfig;

/// Random bytes in a state token, before base64 encoding.
const STATE_LENGTH: usize = 16;

/// An opaque anti-CSRF value tying a callback to the login that started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateToken(String);

impl StateToken {
    /// Generates a cryptographically random state.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..STATE_LENGTH).map(|_| rng.random()).collect();
        Self(URL_SAFE_NO_PAD.encode(&bytes))
    }

    /// Wraps a previously issued state value (e.g. read back from a cookie).
    pub fn from_issued(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the state value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks the `state` returned by the provider against this one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StateMismatch`] if the values differ or either is empty.
    pub fn verify(&self, received: &str) -> Result<(), AuthError> {
        if self.0.is_empty() || !constant_time_eq(self.0.as_bytes(), received.as_bytes()) {
            return Err(AuthError::StateMismatch);
        }
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl OAuthConfig {
    /// Builds the consent page URL for this client.
    ///
    /// Pure function of the configuration and `state`.
    pub fn build_authorization_url(&self, state: &StateToken) -> Url {
        let mut url = self.auth_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scope_param())
            .append_pair("state", state.as_str());
        url
    }
}

/// Trades authorization codes for access tokens.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: Arc<OAuthConfig>,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client for the shared configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(config: Arc<OAuthConfig>, timeout: Duration) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Exchanges a one-time authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ExchangeFailed`] if the code is empty (before any
    /// network call), the request fails, the provider rejects the code, or
    /// the response cannot be parsed.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<Token, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::exchange_failed("missing authorization code"));
        }

        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!(endpoint = %self.config.token_endpoint, "exchanging authorization code");

        let response = self
            .http_client
            .post(self.config.token_endpoint.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                warn!("token exchange request failed: {}", e);
                AuthError::exchange_failed(format!("token request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AuthError::exchange_failed(format!("failed to read token response: {}", e))
        })?;

        if !status.is_success() {
            let reason = describe_error_body(&body);
            warn!(%status, "token exchange rejected: {}", reason);
            return Err(AuthError::exchange_failed(format!("{} ({})", reason, status)));
        }

        let token = parse_token_response(&body)?;
        info!("obtained access token");
        Ok(token)
    }
}

/// Response from the token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Error body from the token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn parse_token_response(body: &str) -> Result<Token, AuthError> {
    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::exchange_failed(format!("invalid token response: {}", e)))?;

    if response.access_token.is_empty() {
        return Err(AuthError::exchange_failed("token response has no access token"));
    }
    if let Some(ref token_type) = response.token_type
        && !token_type.eq_ignore_ascii_case("bearer")
    {
        return Err(AuthError::exchange_failed(format!(
            "unsupported token type '{}'",
            token_type
        )));
    }

    let expires_in = response.expires_in;
    Token::from_expires_in(response.access_token, expires_in, Utc::now()).ok_or_else(|| {
        AuthError::exchange_failed(format!(
            "invalid expires_in {:?} in token response",
            expires_in
        ))
    })
}

fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{}: {}", error, description),
        Ok(TokenErrorResponse { error, .. }) => error,
        Err(_) => "provider rejected the authorization code".to_string(),
    }
}
