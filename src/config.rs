use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;
use crate::session::derive_cookie_key;

/// Address the web server listens on: every interface, fixed port.
pub const BIND_ADDRESS: &str = "0.0.0.0:5000";

pub const DEFAULT_SECRET_KEY: &str = "dev-secret-key-change-in-production";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://instance/site.db?mode=rwc";

/// Runtime settings.
///
/// Resolved from built-in defaults, then an optional `constellate.toml`,
/// then environment variables (`SECRET_KEY`, `DATABASE_URL`, `CSRF_ENABLED`).
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Signs the session cookie.
    pub secret_key: String,
    pub database_url: String,
    /// Require a valid anti-forgery token on every form submission.
    pub csrf_enabled: bool,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::default())
    }

    /// Load settings with `environment` as the highest-priority source.
    pub fn from_environment(environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("secret_key", DEFAULT_SECRET_KEY)?
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("csrf_enabled", true)?
            .add_source(File::with_name("constellate").required(false))
            .add_source(environment.try_parsing(true))
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize::<Settings>()
            .context("invalid configuration")?;

        if settings.secret_key == DEFAULT_SECRET_KEY {
            tracing::warn!("SECRET_KEY is not set, using the development default");
        }

        Ok(settings)
    }
}

/// Create the directory holding a file-backed SQLite database.
pub fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = rest.trim_start_matches("//");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating database directory {}", parent.display());
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Initialize application state for the given settings.
pub async fn initialize_app_state(settings: &Settings, debug: bool) -> Result<AppState> {
    ensure_sqlite_parent_dir(&settings.database_url)?;

    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    Ok(AppState {
        db,
        cookie_key: derive_cookie_key(&settings.secret_key),
        csrf_enabled: settings.csrf_enabled,
        debug,
    })
}
