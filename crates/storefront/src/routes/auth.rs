//! Authentication route handlers.
//!
//! The login view doubles as the registration view (`?mode=register`).
//! Errors are shown as a flash toast after redirecting back to the form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketplace_core::Role;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{set_flash, take_flash};
use crate::models::Toast;
use crate::navigation::{AUTH_PATH, home_for};
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

const REGISTER_PATH: &str = "/auth?mode=register";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub role: Role,
}

/// Which form to show.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub mode: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login / registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub register: bool,
    pub toasts: Vec<Toast>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login (or registration) view.
///
/// Only reached by unauthenticated sessions; the public gate sends signed-in
/// ones to their home.
pub async fn page(session: Session, Query(query): Query<AuthQuery>) -> impl IntoResponse {
    AuthTemplate {
        register: query.mode.as_deref() == Some("register"),
        toasts: take_flash(&session).await.into_iter().collect(),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let service = AuthService::new(state.backend(), state.config().identity_recheck);

    match service.login(&session, &form.email, &form.password).await {
        Ok(identity) => {
            add_breadcrumb("auth", "Logged in", Some(&[("role", identity.role.as_str())]));
            Ok(Redirect::to(home_for(identity.role)).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            let message = AppError::from(e).public_message();
            set_flash(&session, &Toast::error(message)).await?;
            Ok(Redirect::to(AUTH_PATH).into_response())
        }
    }
}

/// Handle registration form submission.
///
/// Shoppers and sellers can register; the new account is signed in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        set_flash(&session, &Toast::error("Passwords do not match")).await?;
        return Ok(Redirect::to(REGISTER_PATH).into_response());
    }

    let service = AuthService::new(state.backend(), state.config().identity_recheck);
    let registration = Registration {
        name: &form.name,
        email: &form.email,
        password: &form.password,
        role: form.role,
    };

    match service.register(&session, &registration).await {
        Ok(identity) => {
            add_breadcrumb("auth", "Registered", Some(&[("role", identity.role.as_str())]));
            Ok(Redirect::to(home_for(identity.role)).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let message = AppError::from(e).public_message();
            set_flash(&session, &Toast::error(message)).await?;
            Ok(Redirect::to(REGISTER_PATH).into_response())
        }
    }
}

/// Log out and return to the login view.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    AuthService::new(state.backend(), state.config().identity_recheck)
        .logout(&session)
        .await?;
    Ok(Redirect::to(AUTH_PATH).into_response())
}
