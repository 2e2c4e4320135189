//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use monthcal_core::TracingOutputFormat;

/// monthcal - your next month of Google Calendar events
#[derive(Debug, Parser)]
#[command(name = "monthcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MONTHCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "MONTHCAL_BIND")]
    pub bind: Option<SocketAddr>,

    /// Path to the Google OAuth client credentials JSON
    #[arg(long, env = "MONTHCAL_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Calendar to read events from
    #[arg(long)]
    pub calendar_id: Option<String>,

    /// Send session cookies without the Secure flag (plain-http development)
    #[arg(long)]
    pub insecure_cookies: bool,

    /// Log format: pretty, compact or json
    #[arg(long)]
    pub log_format: Option<TracingOutputFormat>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}
