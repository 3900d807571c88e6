//! Authentication state machine.
//!
//! A request observes the session through an [`AuthState`] snapshot. The
//! snapshot only moves through [`AuthState::apply`], driven by the
//! [`SessionEvent`]s the authentication service observes (login, logout,
//! identity checks against the backend).
//!
//! ```text
//!                  LoggedIn(r)
//!   Unauthenticated ──────────────► Authenticated(r)
//!        ▲   ▲                         │       ▲
//!        │   │ IdentityRejected        │ Verification
//!        │   │ IdentityUnavailable     │ Due
//!        │   │                         ▼       │ IdentityConfirmed(r)
//!        │   └──────────────────── Unresolved ─┘
//!        │
//!        └──── LoggedOut (from any state)
//! ```

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Authentication state of a session at the moment a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "role", rename_all = "snake_case")]
pub enum AuthState {
    /// A backend token is held but the identity behind it has not been
    /// confirmed yet. Guards must not decide until this is resolved.
    Unresolved,
    /// Identity confirmed with the given role.
    Authenticated(Role),
    /// No usable credentials.
    #[default]
    Unauthenticated,
}

/// Something the authentication service observed about a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend accepted a login and reported the account's role.
    LoggedIn(Role),
    /// The stored identity is stale and must be confirmed again.
    VerificationDue,
    /// The backend confirmed the identity behind the held token.
    IdentityConfirmed(Role),
    /// The backend rejected the held token (expired or revoked).
    IdentityRejected,
    /// The identity check could not reach the backend.
    IdentityUnavailable,
    /// The user logged out.
    LoggedOut,
}

impl AuthState {
    /// Transition function of the state machine.
    #[must_use]
    pub const fn apply(self, event: SessionEvent) -> Self {
        match (self, event) {
            (_, SessionEvent::LoggedIn(role)) => Self::Authenticated(role),
            (_, SessionEvent::LoggedOut | SessionEvent::IdentityRejected) => Self::Unauthenticated,
            (Self::Unauthenticated, _) => Self::Unauthenticated,
            (Self::Authenticated(_) | Self::Unresolved, SessionEvent::VerificationDue) => {
                Self::Unresolved
            }
            (Self::Authenticated(_) | Self::Unresolved, SessionEvent::IdentityConfirmed(role)) => {
                Self::Authenticated(role)
            }
            (Self::Unresolved, SessionEvent::IdentityUnavailable) => Self::Unauthenticated,
            (Self::Authenticated(role), SessionEvent::IdentityUnavailable) => {
                Self::Authenticated(role)
            }
        }
    }

    /// Whether the state is settled (not [`AuthState::Unresolved`]).
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// Whether the session is authenticated.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The authenticated role, if any.
    #[must_use]
    pub const fn role(self) -> Option<Role> {
        match self {
            Self::Authenticated(role) => Some(role),
            Self::Unresolved | Self::Unauthenticated => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [AuthState; 5] = [
        AuthState::Unresolved,
        AuthState::Unauthenticated,
        AuthState::Authenticated(Role::User),
        AuthState::Authenticated(Role::Seller),
        AuthState::Authenticated(Role::Admin),
    ];

    #[test]
    fn test_login_authenticates_from_any_state() {
        for state in ALL_STATES {
            assert_eq!(
                state.apply(SessionEvent::LoggedIn(Role::Seller)),
                AuthState::Authenticated(Role::Seller)
            );
        }
    }

    #[test]
    fn test_logout_and_rejection_always_unauthenticate() {
        for state in ALL_STATES {
            assert_eq!(state.apply(SessionEvent::LoggedOut), AuthState::Unauthenticated);
            assert_eq!(
                state.apply(SessionEvent::IdentityRejected),
                AuthState::Unauthenticated
            );
        }
    }

    #[test]
    fn test_verification_cycle() {
        let state = AuthState::Authenticated(Role::User).apply(SessionEvent::VerificationDue);
        assert_eq!(state, AuthState::Unresolved);
        assert!(!state.is_resolved());

        // The backend may report a different role than the one cached.
        let state = state.apply(SessionEvent::IdentityConfirmed(Role::Admin));
        assert_eq!(state, AuthState::Authenticated(Role::Admin));
    }

    #[test]
    fn test_unreachable_backend_fails_closed_only_when_unresolved() {
        assert_eq!(
            AuthState::Unresolved.apply(SessionEvent::IdentityUnavailable),
            AuthState::Unauthenticated
        );
        assert_eq!(
            AuthState::Authenticated(Role::User).apply(SessionEvent::IdentityUnavailable),
            AuthState::Authenticated(Role::User)
        );
    }

    #[test]
    fn test_unauthenticated_ignores_identity_events() {
        let state = AuthState::Unauthenticated;
        assert_eq!(
            state.apply(SessionEvent::IdentityConfirmed(Role::Admin)),
            AuthState::Unauthenticated
        );
        assert_eq!(state.apply(SessionEvent::VerificationDue), AuthState::Unauthenticated);
    }

    #[test]
    fn test_role_accessor() {
        assert_eq!(AuthState::Authenticated(Role::Seller).role(), Some(Role::Seller));
        assert_eq!(AuthState::Unresolved.role(), None);
        assert_eq!(AuthState::Unauthenticated.role(), None);
        assert!(!AuthState::default().is_authenticated());
    }
}
