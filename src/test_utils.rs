#[cfg(test)]
pub mod test_utils {
    use crate::router::create_router;
    use crate::schemas::AppState;
    use crate::session::derive_cookie_key;
    use axum::Router;
    use axum_test::{TestServer, TestServerConfig};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TEST_SECRET_KEY: &str = "test-secret-key";

    /// Create an in-memory SQLite database for testing
    ///
    /// The pool holds exactly one connection, so every query sees the same
    /// in-memory database.
    pub async fn setup_test_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state(csrf_enabled: bool) -> AppState {
        AppState {
            db: setup_test_db().await,
            cookie_key: derive_cookie_key(TEST_SECRET_KEY),
            csrf_enabled,
            debug: false,
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set. The subscriber stays installed for as
    /// long as the returned guard lives.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr) // Output to stderr, which is captured by tests
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Wrap a router in a test server that keeps cookies between requests,
    /// like a browser would.
    pub fn test_server(app: Router) -> TestServer {
        let config = TestServerConfig {
            save_cookies: true,
            ..TestServerConfig::default()
        };
        TestServer::new_with_config(app, config).expect("Failed to start test server")
    }

    /// Create a test server over a fresh database, returning its state too.
    pub async fn setup_test_server(csrf_enabled: bool) -> (TestServer, AppState) {
        let state = setup_test_app_state(csrf_enabled).await;
        let server = test_server(create_router(state.clone()));
        (server, state)
    }
}
