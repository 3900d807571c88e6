//! Session-related types.
//!
//! Types stored in the session for authentication state and one-shot
//! notifications.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{AuthState, SessionEvent};

use crate::backend::types::Identity;

/// Session-stored authentication record.
///
/// Holds the backend token and the identity last confirmed for it. The
/// identity is `None` until the backend has confirmed who the token
/// belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Identity confirmed by the backend, if any.
    pub identity: Option<Identity>,
    /// Backend bearer token.
    pub access_token: String,
    /// When the identity was last confirmed.
    pub verified_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Record for a fresh login.
    #[must_use]
    pub fn new(access_token: String, identity: Option<Identity>) -> Self {
        Self {
            identity,
            access_token,
            verified_at: Utc::now(),
        }
    }

    /// The auth state this record represents at `now`.
    ///
    /// A record whose identity is older than `recheck` is due for
    /// verification and reads as `Unresolved`.
    #[must_use]
    pub fn auth_state(&self, now: DateTime<Utc>, recheck: Duration) -> AuthState {
        let Some(identity) = &self.identity else {
            return AuthState::Unresolved;
        };

        let state = AuthState::Unauthenticated.apply(SessionEvent::LoggedIn(identity.role));
        let age = now.signed_duration_since(self.verified_at);
        let stale = age.to_std().is_ok_and(|age| age >= recheck);

        if stale {
            state.apply(SessionEvent::VerificationDue)
        } else {
            state
        }
    }

    /// Replace the identity after a successful check.
    pub fn confirm(&mut self, identity: Identity, now: DateTime<Utc>) {
        self.identity = Some(identity);
        self.verified_at = now;
    }
}

/// The authenticated caller of a request.
///
/// Inserted into request extensions by the route guard once access has been
/// granted.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub identity: Identity,
    /// Backend bearer token for calls made on the caller's behalf.
    pub token: String,
}

/// Kind of toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A short notification shown once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    /// CSS modifier class for templates.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Session keys.
pub mod keys {
    /// Key for the authentication record.
    pub const AUTH: &str = "auth";

    /// Key for the one-shot toast shown on the next page render.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marketplace_core::{Role, UserId};

    fn identity(role: Role) -> Identity {
        Identity {
            id: UserId::new("u1"),
            name: "Meera".to_string(),
            email: "meera@example.com".to_string(),
            role,
        }
    }

    const RECHECK: Duration = Duration::from_secs(300);

    #[test]
    fn test_fresh_identity_is_authenticated() {
        let record = SessionRecord::new("t".to_string(), Some(identity(Role::Seller)));
        assert_eq!(
            record.auth_state(record.verified_at, RECHECK),
            AuthState::Authenticated(Role::Seller)
        );
    }

    #[test]
    fn test_missing_identity_is_unresolved() {
        let record = SessionRecord::new("t".to_string(), None);
        assert_eq!(record.auth_state(Utc::now(), RECHECK), AuthState::Unresolved);
    }

    #[test]
    fn test_stale_identity_is_unresolved() {
        let record = SessionRecord::new("t".to_string(), Some(identity(Role::User)));
        let later = record.verified_at + chrono::Duration::seconds(301);
        assert_eq!(record.auth_state(later, RECHECK), AuthState::Unresolved);
    }

    #[test]
    fn test_confirm_refreshes_timestamp() {
        let mut record = SessionRecord::new("t".to_string(), None);
        let later = record.verified_at + chrono::Duration::seconds(600);
        record.confirm(identity(Role::Admin), later);
        assert_eq!(
            record.auth_state(later, RECHECK),
            AuthState::Authenticated(Role::Admin)
        );
    }

    #[test]
    fn test_toast_serializes() {
        let toast = Toast::error("Failed to update order status");
        let json = serde_json::to_string(&toast).unwrap();
        assert!(json.contains("\"error\""));
        assert_eq!(serde_json::from_str::<Toast>(&json).unwrap(), toast);
    }
}
