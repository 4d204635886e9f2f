use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

use crate::schemas::AppState;
use crate::templates;

/// Failures that end a request with a server error page.
///
/// Everything the user can correct (validation, bad credentials, taken
/// usernames, failed registration commits) is rendered in place by the
/// handlers and never reaches this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("session identity {0:?} is not a valid user id")]
    MalformedIdentity(String),
    #[error("cookie middleware unavailable: {0}")]
    Cookies(&'static str),
}

/// Error text attached to a response, read back by [`render_error_pages`].
#[derive(Clone, Debug)]
pub struct ErrorDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let mut response = (status, Html(templates::error_page(status, None))).into_response();
        response.extensions_mut().insert(ErrorDetail(self.to_string()));
        response
    }
}

/// Re-render server error pages with their detail when running with `--debug`.
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorDetail>() {
        Some(ErrorDetail(detail)) if state.debug => {
            let status = response.status();
            (status, Html(templates::error_page(status, Some(&detail)))).into_response()
        }
        _ => response,
    }
}
