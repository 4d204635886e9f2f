use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use model::Authenticatable;
use model::entities::user;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::auth::{CurrentUser, RequireUser, safe_next_target};
use crate::error::AppError;
use crate::forms::{self, FormErrors, LoginForm, RegisterForm};
use crate::schemas::AppState;
use crate::session::{FlashLevel, Session};
use crate::templates;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password.";
pub const USERNAME_TAKEN_MESSAGE: &str = "Username already exists. Please choose a different one.";
pub const EMAIL_TAKEN_MESSAGE: &str = "Email already registered. Please use a different email.";
pub const REGISTRATION_FAILED_MESSAGE: &str = "An error occurred during registration. Please try again.";
pub const REGISTRATION_SUCCESS_MESSAGE: &str = "Registration successful! Please log in.";
pub const LOGGED_OUT_MESSAGE: &str = "You have been logged out.";

/// Query parameters accepted by the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    /// Path to continue to after logging in
    pub next: Option<String>,
}

fn render_login(
    state: &AppState,
    session: &mut Session,
    form: &LoginForm,
    errors: &FormErrors,
    next: Option<&str>,
) -> Response {
    let csrf_token = state.csrf_enabled.then(|| session.csrf_token());
    let flashes = session.take_flashes();
    Html(templates::login_page(form, errors, &flashes, csrf_token.as_deref(), next)).into_response()
}

fn render_register(
    state: &AppState,
    session: &mut Session,
    form: &RegisterForm,
    errors: &FormErrors,
) -> Response {
    let csrf_token = state.csrf_enabled.then(|| session.csrf_token());
    let flashes = session.take_flashes();
    Html(templates::register_page(form, errors, &flashes, csrf_token.as_deref())).into_response()
}

/// GET /login
#[instrument(skip_all)]
pub async fn login_page(
    State(state): State<AppState>,
    current: CurrentUser,
    mut session: Session,
    Query(query): Query<NextQuery>,
) -> Response {
    trace!("Entering login_page function");
    if current.is_authenticated() {
        debug!("Already authenticated, redirecting home");
        return Redirect::to("/").into_response();
    }

    render_login(
        &state,
        &mut session,
        &LoginForm::default(),
        &FormErrors::default(),
        query.next.as_deref(),
    )
}

/// POST /login
#[instrument(skip_all)]
pub async fn login_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    mut session: Session,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    trace!("Entering login_submit function");
    if current.is_authenticated() {
        debug!("Already authenticated, redirecting home");
        return Ok(Redirect::to("/").into_response());
    }

    let errors = forms::validate_on_submit(
        &form,
        state.csrf_enabled,
        session.data().csrf_token.as_deref(),
    );
    if !errors.is_empty() {
        debug!("Login form failed validation: {:?}", errors);
        return Ok(render_login(&state, &mut session, &form, &errors, query.next.as_deref()));
    }

    trace!("Looking up user '{}'", form.username);
    match user::find_by_username(&state.db, &form.username).await? {
        Some(user) if user.is_active() && user.check_password(&form.password) => {
            session.login(user.identity(), form.remember());
            session.flash(FlashLevel::Success, LOGIN_SUCCESS_MESSAGE);

            let target = safe_next_target(query.next.as_deref());
            info!("User {} logged in, redirecting to {}", user.username, target);
            Ok(Redirect::to(target).into_response())
        }
        _ => {
            warn!("Failed login attempt for username '{}'", form.username);
            session.flash(FlashLevel::Error, INVALID_CREDENTIALS_MESSAGE);
            Ok(render_login(
                &state,
                &mut session,
                &form,
                &FormErrors::default(),
                query.next.as_deref(),
            ))
        }
    }
}

/// GET /register
#[instrument(skip_all)]
pub async fn register_page(
    State(state): State<AppState>,
    current: CurrentUser,
    mut session: Session,
) -> Response {
    trace!("Entering register_page function");
    if current.is_authenticated() {
        debug!("Already authenticated, redirecting home");
        return Redirect::to("/").into_response();
    }

    render_register(&state, &mut session, &RegisterForm::default(), &FormErrors::default())
}

/// POST /register
#[instrument(skip_all)]
pub async fn register_submit(
    State(state): State<AppState>,
    current: CurrentUser,
    mut session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    trace!("Entering register_submit function");
    if current.is_authenticated() {
        debug!("Already authenticated, redirecting home");
        return Ok(Redirect::to("/").into_response());
    }

    let mut errors = forms::validate_on_submit(
        &form,
        state.csrf_enabled,
        session.data().csrf_token.as_deref(),
    );
    if !errors.is_empty() {
        debug!("Registration form failed validation: {:?}", errors);
        return Ok(render_register(&state, &mut session, &form, &errors));
    }

    if user::find_by_username(&state.db, &form.username).await?.is_some() {
        debug!("Username '{}' is taken", form.username);
        errors.add_field("username", USERNAME_TAKEN_MESSAGE);
    }
    if let Some(email) = form.email.as_deref() {
        if user::find_by_email(&state.db, email).await?.is_some() {
            debug!("Email '{}' is taken", email);
            errors.add_field("email", EMAIL_TAKEN_MESSAGE);
        }
    }
    if !errors.is_empty() {
        return Ok(render_register(&state, &mut session, &form, &errors));
    }

    trace!("Attempting to insert new user into database");
    match user::register(&state.db, &form.username, form.email.as_deref(), &form.password).await {
        Ok(user_model) => {
            info!(
                "User created successfully with ID: {}, username: {}",
                user_model.id, user_model.username
            );
            session.flash(FlashLevel::Success, REGISTRATION_SUCCESS_MESSAGE);
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => {
            error!("Failed to create user '{}': {}", form.username, e);
            session.flash(FlashLevel::Error, REGISTRATION_FAILED_MESSAGE);
            Ok(render_register(&state, &mut session, &form, &errors))
        }
    }
}

/// GET /logout
#[instrument(skip_all)]
pub async fn logout(RequireUser(user): RequireUser, mut session: Session) -> Redirect {
    trace!("Entering logout function");
    session.logout();
    session.flash(FlashLevel::Info, LOGGED_OUT_MESSAGE);
    info!("User {} logged out", user.username);
    Redirect::to("/login")
}
