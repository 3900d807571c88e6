//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::navigation::AUTH_PATH;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The backend stopped accepting the session's token mid-request; the
    /// session has been destroyed.
    #[error("Session expired")]
    SessionExpired,

    /// Request conflicts with the resource's current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(err) => backend_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::MissingName
                | AuthError::RoleNotAllowed(_) => StatusCode::BAD_REQUEST,
                AuthError::Backend(err) => backend_status(err),
                AuthError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SessionExpired => StatusCode::SEE_OTHER,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Message safe to show to the shopper.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Backend(BackendError::Rejected(_)) => {
                "The request was not accepted".to_string()
            }
            Self::Backend(BackendError::NotFound(_)) => "Not found".to_string(),
            Self::Backend(BackendError::Unauthorized) => "Please sign in again".to_string(),
            Self::Backend(_) => "External service error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::MissingName => "Please enter your name".to_string(),
                AuthError::RoleNotAllowed(_) => "That account type cannot be registered".to_string(),
                AuthError::Backend(_) | AuthError::Session(_) => {
                    "Authentication error".to_string()
                }
            },
            Self::SessionExpired => "Please sign in again".to_string(),
            Self::Conflict(msg) => msg.clone(),
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

const fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
        BackendError::NotFound(_) => StatusCode::NOT_FOUND,
        BackendError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BackendError::Http(_)
        | BackendError::Api { .. }
        | BackendError::Parse(_)
        | BackendError::InvalidUrl(..) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        if matches!(self, Self::SessionExpired) {
            let mut response = Redirect::to(AUTH_PATH).into_response();
            response.extensions_mut().insert(SessionEnded);
            return response;
        }

        // Don't expose internal error details to clients
        (self.status(), self.public_message()).into_response()
    }
}

/// Response extension marking a session destroyed mid-request.
///
/// The route guard swaps the login redirect for a status response when the
/// caller is htmx.
#[derive(Debug, Clone, Copy)]
pub struct SessionEnded;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("orders", "Updated item status", Some(&[("order_id", "o1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Conflict("line is pending".to_string());
        assert_eq!(err.to_string(), "Conflict: line is pending");
        assert_eq!(err.public_message(), "line is pending");
    }

    #[test]
    fn test_session_expired_marks_response() {
        let response = AppError::SessionExpired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.extensions().get::<SessionEnded>().is_some());

        let response = AppError::Internal("boom".to_string()).into_response();
        assert!(response.extensions().get::<SessionEnded>().is_none());
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::SessionExpired),
            StatusCode::SEE_OTHER
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_backend_errors_map_to_gateway_codes() {
        assert_eq!(
            AppError::from(BackendError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(BackendError::Parse("orders".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(BackendError::Rejected("stock".to_string())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_backend_internals_not_exposed() {
        let err = AppError::from(BackendError::Api {
            status: 500,
            message: "MongoServerError: connection refused".to_string(),
        });
        assert_eq!(err.public_message(), "External service error");

        let err = AppError::from(BackendError::Rejected(
            "E11000 duplicate key error collection: orders".to_string(),
        ));
        assert_eq!(err.public_message(), "The request was not accepted");
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::UserAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(AuthError::MissingName).public_message(),
            "Please enter your name"
        );
    }
}
