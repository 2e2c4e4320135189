//! Server configuration.
//!
//! Settings come from `monthcal.toml` (every field optional) and are then
//! overridden by command-line flags and their environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use monthcal_core::TracingOutputFormat;
use monthcal_providers::PRIMARY_CALENDAR;
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{ServerError, ServerResult};

/// Configuration file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "monthcal.toml";

/// Default location of the Google client credentials.
pub const DEFAULT_CREDENTIALS_PATH: &str = ".credentials/calendar_credentials.json";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,

    /// Path to the OAuth client credentials JSON.
    pub credentials_path: PathBuf,

    /// Calendar to list events from.
    pub calendar_id: String,

    /// Upper bound on each outbound request, in seconds.
    pub request_timeout_secs: u64,

    /// Mark session cookies `Secure`. Disable only for plain-http development.
    pub secure_cookies: bool,

    /// Log output format.
    pub log_format: TracingOutputFormat,

    /// Debug logging.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            calendar_id: PRIMARY_CALENDAR.to_string(),
            request_timeout_secs: 30,
            secure_cookies: true,
            log_format: TracingOutputFormat::Compact,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| ServerError::config(format!("{}: {}", path.display(), e)))
    }

    /// Loads the explicit file if one is given, otherwise `monthcal.toml`
    /// from the working directory when present, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if a file exists but is invalid, or if
    /// an explicitly given file is missing.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns the parser's message when the document is invalid.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Applies command-line overrides.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(bind) = cli.bind {
            self.bind = bind;
        }
        if let Some(ref path) = cli.credentials {
            self.credentials_path = path.clone();
        }
        if let Some(ref calendar_id) = cli.calendar_id {
            self.calendar_id = calendar_id.clone();
        }
        if cli.insecure_cookies {
            self.secure_cookies = false;
        }
        if let Some(format) = cli.log_format {
            self.log_format = format;
        }
        self.debug |= cli.debug;
        self
    }

    /// Builder: set the listen address.
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Builder: set the credentials path.
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Builder: set cookie `Secure` flag.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Returns the outbound request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(
            config.credentials_path,
            PathBuf::from(".credentials/calendar_credentials.json")
        );
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.secure_cookies);
        assert!(!config.debug);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            bind = "0.0.0.0:3000"
            secure_cookies = false
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind.port(), 3000);
        assert!(!config.secure_cookies);
        assert_eq!(config.log_format, TracingOutputFormat::Json);
        assert_eq!(config.calendar_id, "primary");
    }

    #[test]
    fn invalid_toml() {
        assert!(ServerConfig::from_toml("bind = 42").is_err());
        assert!(ServerConfig::from_toml("log_format = \"xml\"").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "calendar_id = \"team@example.com\"").unwrap();
        writeln!(file, "request_timeout_secs = 5").unwrap();

        let config = ServerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.calendar_id, "team@example.com");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let err = ServerConfig::load(Some(Path::new("/nonexistent/monthcal.toml"))).unwrap_err();
        assert!(matches!(err, ServerError::Config { .. }));
    }

    #[test]
    fn cli_overrides_file() {
        let cli = Cli::parse_from([
            "monthcal",
            "--bind",
            "127.0.0.1:9000",
            "--credentials",
            "/etc/monthcal/creds.json",
            "--insecure-cookies",
            "--log-format",
            "pretty",
            "--debug",
        ]);
        let config = ServerConfig::default().merge_cli(&cli);
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(
            config.credentials_path,
            PathBuf::from("/etc/monthcal/creds.json")
        );
        assert!(!config.secure_cookies);
        assert_eq!(config.log_format, TracingOutputFormat::Pretty);
        assert!(config.debug);
    }

    #[test]
    fn builders() {
        let config = ServerConfig::default()
            .with_bind("0.0.0.0:80".parse().unwrap())
            .with_credentials_path("creds.json")
            .with_secure_cookies(false);
        assert_eq!(config.bind.port(), 80);
        assert_eq!(config.credentials_path, PathBuf::from("creds.json"));
        assert!(!config.secure_cookies);
    }
}
