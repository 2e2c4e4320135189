//! monthcal server entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, error};

use monthcal_core::{TracingConfig, init_tracing};
use monthcal_server::cli::Cli;
use monthcal_server::{ServerConfig, ShutdownSignal};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ServerConfig::load(cli.config.as_deref()) {
        Ok(config) => config.merge_cli(&cli),
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = if config.debug { Level::DEBUG } else { Level::INFO };
    if let Err(e) = init_tracing(
        TracingConfig::server()
            .with_level(level)
            .with_format(config.log_format),
    ) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let shutdown = ShutdownSignal::new();
    shutdown.spawn_listener();

    match monthcal_server::run(config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
