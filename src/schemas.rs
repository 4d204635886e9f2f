use std::fmt;

use sea_orm::DatabaseConnection;
use tower_cookies::Key;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Key signing the session cookie
    pub cookie_key: Key,
    /// Whether form submissions must carry a CSRF token
    pub csrf_enabled: bool,
    /// Render error details into 500 pages
    pub debug: bool,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("csrf_enabled", &self.csrf_enabled)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
