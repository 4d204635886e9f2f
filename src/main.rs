use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod cli;
mod config;
mod error;
mod forms;
mod handlers;
mod router;
mod schemas;
mod session;
mod templates;

#[cfg(test)]
mod test_utils;

use cli::Cli;

/// Main entry point for the Constellate application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "constellate=debug,tower_http=debug,axum::rejection=trace"
    } else {
        "constellate=info,tower_http=info"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Constellate starting up");

    cli.run().await
}
