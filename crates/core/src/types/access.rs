//! Route access decisions.
//!
//! [`authorize`] is the whole of the route guard's policy; [`gate_public`]
//! is its inverse for the login view. Both are pure, so every request
//! re-evaluates them against its own session snapshot.

use super::auth::AuthState;
use super::role::{Role, RoleSet};

/// Roles admitted to a route subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteRequirement {
    allowed: RoleSet,
}

impl RouteRequirement {
    /// Admit any role in `allowed`.
    #[must_use]
    pub const fn roles(allowed: RoleSet) -> Self {
        Self { allowed }
    }

    /// Admit a single role.
    #[must_use]
    pub const fn only(role: Role) -> Self {
        Self::roles(RoleSet::only(role))
    }

    /// The admitted roles.
    #[must_use]
    pub const fn allowed(self) -> RoleSet {
        self.allowed
    }

    /// Whether `role` is admitted.
    #[must_use]
    pub const fn allows(self, role: Role) -> bool {
        self.allowed.contains(role)
    }
}

/// What a guarded route does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Render the requested view for the given role.
    Render(Role),
    /// Not logged in: send to the login view.
    RedirectToAuth,
    /// Logged in with a role the route does not admit.
    Denied,
    /// The session has not been resolved yet; decide after the identity check.
    Pending,
}

/// What the login view does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicGateOutcome {
    /// Show the login view.
    RenderLogin,
    /// Already logged in: leave the auth flow for the role's home.
    RedirectHome(Role),
    /// The session has not been resolved yet.
    Pending,
}

/// Decide whether a session may reach a route with `requirement`.
///
/// ```
/// use marketplace_core::{AuthState, GuardOutcome, Role, RouteRequirement, authorize};
///
/// let sellers = RouteRequirement::only(Role::Seller);
///
/// assert_eq!(authorize(AuthState::Unauthenticated, sellers), GuardOutcome::RedirectToAuth);
/// assert_eq!(authorize(AuthState::Authenticated(Role::User), sellers), GuardOutcome::Denied);
/// assert_eq!(
///     authorize(AuthState::Authenticated(Role::Seller), sellers),
///     GuardOutcome::Render(Role::Seller)
/// );
/// ```
#[must_use]
pub const fn authorize(state: AuthState, requirement: RouteRequirement) -> GuardOutcome {
    match state {
        AuthState::Unresolved => GuardOutcome::Pending,
        AuthState::Unauthenticated => GuardOutcome::RedirectToAuth,
        AuthState::Authenticated(role) if requirement.allows(role) => GuardOutcome::Render(role),
        AuthState::Authenticated(_) => GuardOutcome::Denied,
    }
}

/// Decide what the login view does for a session.
#[must_use]
pub const fn gate_public(state: AuthState) -> PublicGateOutcome {
    match state {
        AuthState::Unresolved => PublicGateOutcome::Pending,
        AuthState::Unauthenticated => PublicGateOutcome::RenderLogin,
        AuthState::Authenticated(role) => PublicGateOutcome::RedirectHome(role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_requirement() -> Vec<RouteRequirement> {
        // All 8 subsets of the three roles.
        (0u8..8)
            .map(|bits| {
                Role::ALL
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| bits & (1 << i) != 0)
                    .map(|(_, role)| role)
                    .collect::<RoleSet>()
            })
            .map(RouteRequirement::roles)
            .collect()
    }

    #[test]
    fn test_unauthenticated_always_redirects_to_auth() {
        for requirement in every_requirement() {
            assert_eq!(
                authorize(AuthState::Unauthenticated, requirement),
                GuardOutcome::RedirectToAuth
            );
        }
    }

    #[test]
    fn test_access_granted_iff_role_in_set() {
        for requirement in every_requirement() {
            for role in Role::ALL {
                let outcome = authorize(AuthState::Authenticated(role), requirement);
                if requirement.allowed().contains(role) {
                    assert_eq!(outcome, GuardOutcome::Render(role));
                } else {
                    assert_eq!(outcome, GuardOutcome::Denied);
                }
            }
        }
    }

    #[test]
    fn test_unresolved_never_decides() {
        for requirement in every_requirement() {
            assert_eq!(authorize(AuthState::Unresolved, requirement), GuardOutcome::Pending);
        }
        assert_eq!(gate_public(AuthState::Unresolved), PublicGateOutcome::Pending);
    }

    #[test]
    fn test_public_gate() {
        assert_eq!(
            gate_public(AuthState::Unauthenticated),
            PublicGateOutcome::RenderLogin
        );
        for role in Role::ALL {
            assert_eq!(
                gate_public(AuthState::Authenticated(role)),
                PublicGateOutcome::RedirectHome(role)
            );
        }
    }

    #[test]
    fn test_user_cannot_reach_admin() {
        assert_eq!(
            authorize(
                AuthState::Authenticated(Role::User),
                RouteRequirement::only(Role::Admin)
            ),
            GuardOutcome::Denied
        );
    }
}
