//! Web server: OAuth login, cookie session, next-month events page.
//!
//! This crate provides the `monthcal` server that handles:
//! - The Google OAuth authorization-code flow with CSRF state
//! - Token storage in a hardened session cookie
//! - Rendering the next calendar month of events
//!
//! # Example
//!
//! ```rust,no_run
//! use monthcal_server::{ServerConfig, ShutdownSignal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     monthcal_server::run(config, ShutdownSignal::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
mod config;
mod error;
mod render;
mod routes;
mod session;
mod signals;

pub use config::{DEFAULT_CONFIG_FILE, DEFAULT_CREDENTIALS_PATH, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use render::{error_page, events_page, home_page, html_escape};
pub use routes::{AppState, CallbackParams, router};
pub use session::{CookieSessionStore, STATE_COOKIE, TOKEN_COOKIE, read_cookie};
pub use signals::ShutdownSignal;

use tracing::info;

/// Loads credentials, binds the listener and serves until `shutdown` fires.
///
/// # Errors
///
/// Returns [`ServerError`] if the credentials are invalid, the address
/// cannot be bound, or the server fails while running.
pub async fn run(config: ServerConfig, shutdown: ShutdownSignal) -> ServerResult<()> {
    let state = AppState::from_config(&config, shutdown.token())?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| ServerError::bind(config.bind, e))?;
    info!("listening on http://{}", config.bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    info!("server stopped");
    Ok(())
}
