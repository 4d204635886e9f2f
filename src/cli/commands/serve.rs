use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use super::run_migrations;
use crate::config::{BIND_ADDRESS, Settings, initialize_app_state};
use crate::router::create_router;

pub async fn serve(settings: &Settings, debug_mode: bool) -> Result<()> {
    trace!("Entering serve function");
    info!("Constellate application starting up");
    debug!("Database URL: {}", settings.database_url);
    debug!("CSRF protection enabled: {}", settings.csrf_enabled);

    // Initialize application state
    trace!("Initializing application state");
    let state = match initialize_app_state(settings, debug_mode).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    // The schema is created on startup when absent
    run_migrations(&state.db).await?;

    let app = create_router(state);
    debug!("Router created successfully");

    info!("Starting server on {}", BIND_ADDRESS);
    let listener = match TcpListener::bind(BIND_ADDRESS).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", BIND_ADDRESS, e);
            return Err(e.into());
        }
    };

    info!("Constellate running on http://{}", BIND_ADDRESS);
    if debug_mode {
        info!("Debug mode: error pages include error details");
    }

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
