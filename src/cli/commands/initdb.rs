use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, error, info, trace};

use crate::config::ensure_sqlite_parent_dir;

/// Apply every pending migration on `db`.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    info!("Running database migrations");
    trace!("Executing migration up command");
    match Migrator::up(db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
            debug!("All pending migrations have been applied");
            Ok(())
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            Err(e.into())
        }
    }
}

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");
    debug!("Database URL: {}", database_url);

    ensure_sqlite_parent_dir(database_url)?;

    trace!("Attempting to connect to database");
    let db: DatabaseConnection = match Database::connect(database_url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    run_migrations(&db).await?;

    info!("Database initialization completed successfully!");
    Ok(())
}
