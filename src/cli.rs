use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use commands::{init_database, serve};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "constellate")]
#[command(about = "Constellate web application: accounts, sessions and the graph view")]
#[command(version)]
pub struct Cli {
    /// Enable debug mode
    ///
    /// Renders error details into server error pages and raises the default
    /// log level to debug.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Defaults to `serve` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema if needed and start the web server
    Serve,
    /// Initialize the database using migrations
    ///
    /// Examples:
    ///   SQLite: sqlite:///path/to/database.sqlite?mode=rwc
    ///   SQLite: sqlite://instance/site.db?mode=rwc (relative path)
    InitDb {
        /// Database URL
        ///
        /// Falls back to the configured DATABASE_URL. The parent directory of
        /// a SQLite file is created automatically if it doesn't exist.
        #[arg(short, long)]
        database_url: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let settings = Settings::load()?;

        match self.command.unwrap_or(Commands::Serve) {
            Commands::Serve => {
                serve(&settings, self.debug).await?;
            }
            Commands::InitDb { database_url } => {
                let database_url = database_url.unwrap_or_else(|| settings.database_url.clone());
                init_database(&database_url).await?;
            }
        }
        Ok(())
    }
}
