//! Showrunner - Operator Console
//!
//! CLI entry point for browsing shows and driving episode generation.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod context;
mod environment;
mod loader;
mod shutdown;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showrunner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = cli::Cli::parse();

    let config = loader::load_config()?;
    if config.api.auth_token.is_none() {
        warn!("No API token configured; set SHOWRUNNER_API__AUTH_TOKEN if the backend requires one");
    }
    debug!(
        api = %config.api.base_url,
        realtime = %config.realtime.url,
        "Showrunner v{}",
        env!("CARGO_PKG_VERSION")
    );

    cli::run(cli, config).await
}
