//! Marketplace roles and role sets.
//!
//! Every authenticated session carries exactly one [`Role`]. Route subtrees
//! declare the roles they admit as a [`RoleSet`], built at compile time.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The role of an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A shopper: catalog, cart, checkout, order history.
    User,
    /// A merchant: store dashboard, products, order fulfillment.
    Seller,
    /// Marketplace operator: moderation and management screens.
    Admin,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 3] = [Self::User, Self::Seller, Self::Admin];

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::User => 0b001,
            Self::Seller => 0b010,
            Self::Admin => 0b100,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// A set of roles.
///
/// ```
/// use marketplace_core::{Role, RoleSet};
///
/// const STAFF: RoleSet = RoleSet::only(Role::Seller).with(Role::Admin);
///
/// assert!(STAFF.contains(Role::Admin));
/// assert!(!STAFF.contains(Role::User));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    /// The empty set; no role is admitted.
    pub const EMPTY: Self = Self(0);

    /// Every role.
    pub const ALL: Self = Self(0b111);

    /// A set containing a single role.
    #[must_use]
    pub const fn only(role: Role) -> Self {
        Self(role.bit())
    }

    /// This set with `role` added.
    #[must_use]
    pub const fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    /// Whether `role` is a member of the set.
    #[must_use]
    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Whether the set has no members.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members of the set, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Role::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Seller).unwrap(), "\"seller\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_set_membership() {
        let set = RoleSet::only(Role::User);
        assert!(set.contains(Role::User));
        assert!(!set.contains(Role::Seller));
        assert!(!set.contains(Role::Admin));

        let set = set.with(Role::Admin);
        assert!(set.contains(Role::Admin));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Role::User, Role::Admin]);
    }

    #[test]
    fn test_role_set_empty_and_all() {
        assert!(RoleSet::EMPTY.is_empty());
        assert!(Role::ALL.iter().all(|r| RoleSet::ALL.contains(*r)));
        assert_eq!(Role::ALL.into_iter().collect::<RoleSet>(), RoleSet::ALL);
    }

    #[test]
    fn test_role_set_display() {
        let set = RoleSet::only(Role::Seller).with(Role::User);
        assert_eq!(set.to_string(), "{user, seller}");
        assert_eq!(RoleSet::EMPTY.to_string(), "{}");
    }
}
