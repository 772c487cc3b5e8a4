mod analysis;
mod auth;
mod cli;
mod config;
mod errors;
mod gateway;
mod models;
mod routes;
mod session;
mod state;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{handle_command, Cli};
use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume client v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "API: {} (timeout {}s), session file: {}",
        config.api_url,
        config.http_timeout_secs,
        config.session_file.display()
    );

    let state = AppState::build(config, cli.ephemeral)?;
    handle_command(&state, cli.command).await
}
