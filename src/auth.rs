//! Resolving the session identity into a user, and guarding protected routes.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Response},
};
use model::entities::user;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::schemas::AppState;
use crate::session::Session;
use crate::templates;

/// Outcome of resolving a stored session identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityLookup {
    Found(user::Model),
    /// Well-formed id with no matching user, including ids outside the
    /// range of the users table key.
    NotFound(i64),
    /// The stored identity is not an integer.
    Malformed(String),
}

/// Decode a raw session identity into a user id.
pub fn decode_user_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::MalformedIdentity(raw.to_string()))
}

pub async fn load_user<C: ConnectionTrait>(db: &C, raw: &str) -> Result<IdentityLookup, DbErr> {
    let id = match decode_user_id(raw) {
        Ok(id) => id,
        Err(_) => return Ok(IdentityLookup::Malformed(raw.to_string())),
    };

    let Ok(key) = i32::try_from(id) else {
        return Ok(IdentityLookup::NotFound(id));
    };

    Ok(match user::Entity::find_by_id(key).one(db).await? {
        Some(user) => IdentityLookup::Found(user),
        None => IdentityLookup::NotFound(id),
    })
}

/// The caller of the current request.
#[derive(Debug, Clone)]
pub enum CurrentUser {
    Anonymous,
    Authenticated(user::Model),
}

impl CurrentUser {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, CurrentUser::Authenticated(_))
    }

    pub fn user(&self) -> Option<&user::Model> {
        match self {
            CurrentUser::Authenticated(user) => Some(user),
            CurrentUser::Anonymous => None,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        let Some(raw) = session.user_id() else {
            return Ok(CurrentUser::Anonymous);
        };

        match load_user(&state.db, raw).await? {
            IdentityLookup::Found(user) => Ok(CurrentUser::Authenticated(user)),
            IdentityLookup::NotFound(id) => {
                debug!("Session references unknown user {}, treating as anonymous", id);
                Ok(CurrentUser::Anonymous)
            }
            IdentityLookup::Malformed(raw) => Err(AppError::MalformedIdentity(raw)),
        }
    }
}

/// Extractor for routes that need a logged-in user.
#[derive(Debug, Clone)]
pub struct RequireUser(pub user::Model);

/// Why a protected route refused the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Anonymous caller; `next` is the path they asked for.
    Unauthorized { next: String },
    Failed(AppError),
}

impl From<AppError> for AuthRejection {
    fn from(error: AppError) -> Self {
        AuthRejection::Failed(error)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthorized { next } => (
                StatusCode::UNAUTHORIZED,
                Html(templates::unauthorized_page(&next)),
            )
                .into_response(),
            AuthRejection::Failed(error) => error.into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await? {
            CurrentUser::Authenticated(user) => Ok(RequireUser(user)),
            CurrentUser::Anonymous => {
                let next = parts.uri.path().to_string();
                warn!("Anonymous request to protected route {}", next);
                Err(AuthRejection::Unauthorized { next })
            }
        }
    }
}

/// Pick the post-login redirect target.
///
/// Only same-site relative paths are accepted; anything else falls back to `/`.
/// Browsers strip tabs and newlines from URLs and read `\` as `/`, so any
/// control character or backslash disqualifies the target.
pub fn safe_next_target(next: Option<&str>) -> &str {
    match next {
        Some(target)
            if target.starts_with('/')
                && !target.starts_with("//")
                && !target.chars().any(|c| c.is_control() || c == '\\') =>
        {
            target
        }
        _ => "/",
    }
}
