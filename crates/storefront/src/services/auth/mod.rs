//! Authentication service.
//!
//! The only code that mutates the session's authentication record. Login
//! and registration store a backend token, logout destroys the session, and
//! [`AuthService::resolve`] settles an `Unresolved` session by asking the
//! backend who the token belongs to.

mod error;

pub use error::AuthError;

use std::time::Duration;

use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use marketplace_core::{AuthState, Email, Role, SessionEvent};

use crate::backend::types::{AuthResponse, Identity, LoginRequest, RegisterRequest};
use crate::backend::{BackendClient, BackendError};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::session::CurrentSession;
use crate::models::{SessionRecord, session_keys};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// A settled view of the session for one request.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Resolved auth state; never `Unresolved`.
    pub state: AuthState,
    /// Identity and token when authenticated.
    pub current: Option<CurrentSession>,
}

impl SessionSnapshot {
    const fn anonymous() -> Self {
        Self {
            state: AuthState::Unauthenticated,
            current: None,
        }
    }
}

/// Registration form input.
#[derive(Debug)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Authentication service.
///
/// Handles login, registration, logout and identity checks against the
/// backend.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
    recheck: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(backend: &'a BackendClient, recheck: Duration) -> Self {
        Self { backend, recheck }
    }

    // =========================================================================
    // Login & Registration
    // =========================================================================

    /// Log in with email and password.
    ///
    /// On success the session id is cycled and the new record stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the backend refuses the
    /// credentials.
    #[instrument(skip(self, session, password))]
    pub async fn login(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;

        let response = self
            .backend
            .login(&LoginRequest {
                email: email.as_str(),
                password,
            })
            .await
            .map_err(|e| match e {
                BackendError::Unauthorized | BackendError::NotFound(_) => {
                    AuthError::InvalidCredentials
                }
                BackendError::Api { status: 400, .. } => AuthError::InvalidCredentials,
                other => AuthError::Backend(other),
            })?;

        self.establish(session, response).await
    }

    /// Register a new account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName`, `AuthError::InvalidEmail`,
    /// `AuthError::WeakPassword` or `AuthError::RoleNotAllowed` for invalid
    /// input, and `AuthError::UserAlreadyExists` if the email is taken.
    #[instrument(skip(self, session, registration), fields(role = %registration.role))]
    pub async fn register(
        &self,
        session: &Session,
        registration: &Registration<'_>,
    ) -> Result<Identity, AuthError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        if registration.role == Role::Admin {
            return Err(AuthError::RoleNotAllowed(registration.role));
        }
        let email = Email::parse(registration.email)?;
        validate_password(registration.password)?;

        let response = self
            .backend
            .register(&RegisterRequest {
                name,
                email: email.as_str(),
                password: registration.password,
                role: registration.role,
            })
            .await
            .map_err(|e| match e {
                BackendError::Api { status: 409, .. } => AuthError::UserAlreadyExists,
                BackendError::Rejected(msg) if msg.to_lowercase().contains("exist") => {
                    AuthError::UserAlreadyExists
                }
                other => AuthError::Backend(other),
            })?;

        self.establish(session, response).await
    }

    /// Store the token from a login/registration response.
    async fn establish(
        &self,
        session: &Session,
        response: AuthResponse,
    ) -> Result<Identity, AuthError> {
        let identity = match response.user {
            Some(identity) => identity,
            None => self.backend.current_identity(&response.token).await?,
        };

        // Fresh id on privilege change
        session.cycle_id().await?;
        session
            .insert(
                session_keys::AUTH,
                SessionRecord::new(response.token, Some(identity.clone())),
            )
            .await?;

        set_sentry_user(&identity.id, Some(&identity.email));
        tracing::info!(user_id = %identity.id, role = %identity.role, "Session established");

        Ok(identity)
    }

    /// Log out and destroy the session.
    ///
    /// The backend is told to revoke the token; failure to reach it is
    /// logged and does not keep the session alive.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store cannot be flushed.
    #[instrument(skip_all)]
    pub async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        let record: Option<SessionRecord> = session.get(session_keys::AUTH).await?;

        if let Some(record) = record
            && let Err(e) = self.backend.logout(&record.access_token).await
        {
            tracing::warn!(error = %e, "Backend logout failed");
        }

        session.flush().await?;
        clear_sentry_user();
        Ok(())
    }

    // =========================================================================
    // Identity Resolution
    // =========================================================================

    /// Settle the session's auth state for the current request.
    ///
    /// A fresh identity is used as-is. Otherwise the backend is asked to
    /// confirm the token: a confirmation updates the stored record, a 401
    /// destroys the session, and any other failure treats this request as
    /// unauthenticated while keeping the session for the next attempt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    pub async fn resolve(&self, session: &Session) -> Result<SessionSnapshot, AuthError> {
        let Some(mut record) = session.get::<SessionRecord>(session_keys::AUTH).await? else {
            return Ok(SessionSnapshot::anonymous());
        };

        let now = Utc::now();
        let state = record.auth_state(now, self.recheck);

        if state.is_resolved() {
            return Ok(Self::snapshot(state, record));
        }

        match self.backend.current_identity(&record.access_token).await {
            Ok(identity) => {
                let state = state.apply(SessionEvent::IdentityConfirmed(identity.role));
                record.confirm(identity, now);
                session.insert(session_keys::AUTH, &record).await?;
                tracing::debug!(state = ?state, "Identity confirmed");
                Ok(Self::snapshot(state, record))
            }
            Err(BackendError::Unauthorized) => {
                let state = state.apply(SessionEvent::IdentityRejected);
                tracing::info!("Backend rejected session token, clearing session");
                session.flush().await?;
                clear_sentry_user();
                Ok(SessionSnapshot {
                    state,
                    current: None,
                })
            }
            Err(e) => {
                let state = state.apply(SessionEvent::IdentityUnavailable);
                tracing::warn!(error = %e, "Identity check failed");
                Ok(SessionSnapshot {
                    state,
                    current: None,
                })
            }
        }
    }

    fn snapshot(state: AuthState, record: SessionRecord) -> SessionSnapshot {
        let current = match (state, record.identity) {
            (AuthState::Authenticated(_), Some(identity)) => Some(CurrentSession {
                identity,
                token: record.access_token,
            }),
            _ => None,
        };
        SessionSnapshot { state, current }
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;
    use url::Url;

    use super::*;
    use crate::config::BackendConfig;
    use marketplace_core::UserId;

    fn unreachable_backend() -> BackendClient {
        // Port 9 (discard) is never served in test environments.
        BackendClient::new(&BackendConfig {
            api_url: Url::parse("http://127.0.0.1:9/api").unwrap(),
            api_key: None,
            timeout_secs: 1,
        })
        .unwrap()
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_admin_cannot_self_register() {
        let backend = unreachable_backend();
        let service = AuthService::new(&backend, Duration::from_secs(300));
        let err = service
            .register(
                &session(),
                &Registration {
                    name: "Root",
                    email: "root@example.com",
                    password: "correct horse",
                    role: Role::Admin,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RoleNotAllowed(Role::Admin)));
    }

    #[tokio::test]
    async fn test_register_requires_name() {
        let backend = unreachable_backend();
        let service = AuthService::new(&backend, Duration::from_secs(300));
        let err = service
            .register(
                &session(),
                &Registration {
                    name: "   ",
                    email: "a@example.com",
                    password: "correct horse",
                    role: Role::User,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingName));
    }

    #[tokio::test]
    async fn test_empty_session_resolves_anonymous() {
        let backend = unreachable_backend();
        let service = AuthService::new(&backend, Duration::from_secs(300));
        let snapshot = service.resolve(&session()).await.unwrap();
        assert_eq!(snapshot.state, AuthState::Unauthenticated);
        assert!(snapshot.current.is_none());
    }

    #[tokio::test]
    async fn test_fresh_record_resolves_without_backend() {
        let backend = unreachable_backend();
        let service = AuthService::new(&backend, Duration::from_secs(300));
        let session = session();
        let identity = Identity {
            id: UserId::new("s1"),
            name: "Kiran Textiles".to_string(),
            email: "kiran@example.com".to_string(),
            role: Role::Seller,
        };
        session
            .insert(
                session_keys::AUTH,
                SessionRecord::new("tok".to_string(), Some(identity)),
            )
            .await
            .unwrap();

        let snapshot = service.resolve(&session).await.unwrap();
        assert_eq!(snapshot.state, AuthState::Authenticated(Role::Seller));
        assert_eq!(snapshot.current.unwrap().token, "tok");
    }

    #[tokio::test]
    async fn test_unreachable_backend_degrades_without_flushing() {
        let backend = unreachable_backend();
        let service = AuthService::new(&backend, Duration::from_secs(300));
        let session = session();
        session
            .insert(
                session_keys::AUTH,
                SessionRecord::new("tok".to_string(), None),
            )
            .await
            .unwrap();

        let snapshot = service.resolve(&session).await.unwrap();
        assert_eq!(snapshot.state, AuthState::Unauthenticated);
        // Record survives for the next request to retry.
        assert!(
            session
                .get::<SessionRecord>(session_keys::AUTH)
                .await
                .unwrap()
                .is_some()
        );
    }
}
