//! TaskPilot CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

mod commands;
mod output;

use commands::Cli;
use taskpilot_core::config::{ClientConfig, LoggingConfig};
use taskpilot_core::error::AppError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&e.to_string());
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);
    tracing::debug!(
        config = %cli.config,
        base_url = %config.api.base_url,
        "Configuration loaded"
    );

    if let Err(e) = cli.execute(&config).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Loads the base file named on the command line plus the
/// `config/{TASKPILOT_ENV}.toml` overlay and `TASKPILOT__*` variables.
fn load_configuration(config_path: &str) -> Result<ClientConfig, AppError> {
    let env = std::env::var("TASKPILOT_ENV").unwrap_or_else(|_| "development".to_string());
    ClientConfig::load(config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
