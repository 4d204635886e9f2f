use crate::error::render_error_pages;
use crate::handlers::{
    auth::{login_page, login_submit, logout, register_page, register_submit},
    pages::{graph, index},
};
use crate::schemas::AppState;
use axum::{Router, middleware, routing::get};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/graph", get(graph))
        // Authentication routes
        .route("/login", get(login_page).post(login_submit))
        .route("/register", get(register_page).post(register_submit))
        .route("/logout", get(logout))
        .layer(middleware::from_fn_with_state(state.clone(), render_error_pages))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CookieManagerLayer::new()),
        )
        .with_state(state)
}
