//! Server error types.

use std::io;
use std::net::SocketAddr;

use monthcal_providers::ConfigError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that abort server startup or shutdown.
///
/// Request-path failures never surface here; handlers turn them into
/// responses.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error while serving.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OAuth client credentials are missing or invalid.
    #[error("Credentials error: {0}")]
    Credentials(#[from] ConfigError),

    /// The server configuration file is unreadable or malformed.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The listen address could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a bind error.
    pub fn bind(addr: SocketAddr, source: io::Error) -> Self {
        Self::Bind { addr, source }
    }
}
