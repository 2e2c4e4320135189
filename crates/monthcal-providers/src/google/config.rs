//! OAuth client configuration for Google.
//!
//! [`OAuthConfig`] is loaded once from the credentials JSON downloaded from
//! the Google Cloud Console and then shared read-only for the lifetime of
//! the process.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Google's authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google's token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Read-only access to the user's calendars.
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Structure of Google's OAuth credentials JSON file.
///
/// The client lives in either a `web` or an `installed` section.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    web: Option<ClientSection>,
    installed: Option<ClientSection>,
}

/// OAuth client entry within the credentials JSON file.
#[derive(Debug, Deserialize)]
struct ClientSection {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

/// Provider identity, scopes and endpoints for the authorization-code flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
    /// Where the provider sends the user back with the code.
    pub redirect_uri: Url,
    /// Scopes requested at authorization time.
    pub scopes: BTreeSet<String>,
    /// The provider's consent page.
    pub auth_endpoint: Url,
    /// The provider's code-for-token endpoint.
    pub token_endpoint: Url,
}

impl OAuthConfig {
    /// Creates a configuration for Google's endpoints with the read-only
    /// calendar scope.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a field is empty or the redirect URI is
    /// not an absolute URL.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: &str,
    ) -> Result<Self, ConfigError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() {
            return Err(ConfigError::MissingField("client_id"));
        }
        if client_secret.trim().is_empty() {
            return Err(ConfigError::MissingField("client_secret"));
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: parse_url("redirect_uri", redirect_uri)?,
            scopes: BTreeSet::from([CALENDAR_READONLY_SCOPE.to_string()]),
            auth_endpoint: parse_url("auth_uri", GOOGLE_AUTH_URL)?,
            token_endpoint: parse_url("token_uri", GOOGLE_TOKEN_URL)?,
        })
    }

    /// Loads the configuration from a credentials JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses a Google credentials JSON string.
    ///
    /// The first entry of `redirect_uris` becomes the redirect URI. Endpoints
    /// in the file override Google's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed, has no `web` or
    /// `installed` section, or lacks a client ID, secret or redirect URI.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| ConfigError::parse(format!("invalid credentials JSON: {}", e)))?;

        let section = file.web.or(file.installed).ok_or_else(|| {
            ConfigError::parse("credentials file must contain a 'web' or 'installed' section")
        })?;

        let redirect_uri = section
            .redirect_uris
            .first()
            .ok_or(ConfigError::MissingField("redirect_uris"))?;

        let mut config = Self::new(section.client_id, section.client_secret, redirect_uri)?;
        if let Some(ref auth_uri) = section.auth_uri {
            config.auth_endpoint = parse_url("auth_uri", auth_uri)?;
        }
        if let Some(ref token_uri) = section.token_uri {
            config.token_endpoint = parse_url("token_uri", token_uri)?;
        }
        Ok(config)
    }

    /// Overrides the token endpoint.
    pub fn with_token_endpoint(mut self, endpoint: Url) -> Self {
        self.token_endpoint = endpoint;
        self
    }

    /// Returns the scopes as the space-separated `scope` parameter value.
    pub fn scope_param(&self) -> String {
        self.scopes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })
}
