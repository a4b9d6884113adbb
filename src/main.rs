//! CourseChat server: presence and room broadcast for course chat.
//!
//! Loads configuration, installs the tracing subscriber, and runs the HTTP
//! and WebSocket server until a shutdown signal arrives.

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use coursechat_core::config::{AppConfig, LogFormat, LoggingConfig};

/// Environment variable selecting the `config/{env}.toml` overlay.
const ENV_VAR: &str = "COURSECHAT_ENV";

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting CourseChat");

    if let Err(e) = coursechat_api::run_server(config)
        .await
        .context("server terminated with an error")
    {
        tracing::error!(error = %format!("{e:#}"), "Server error");
        std::process::exit(1);
    }
}

fn load_configuration() -> anyhow::Result<AppConfig> {
    let env = std::env::var(ENV_VAR).unwrap_or_else(|_| "development".to_owned());
    AppConfig::load(&env).with_context(|| format!("loading configuration for env '{env}'"))
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = fmt().with_env_filter(filter).with_target(true);

    match logging.format {
        LogFormat::Json => builder.json().with_current_span(false).init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}
