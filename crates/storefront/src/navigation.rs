//! Route table and role homes.
//!
//! Every path the storefront serves belongs to one [`Area`]. The router is
//! composed from these areas (each role area behind its own guard), and the
//! CLI and tests read the same table, so the two cannot drift apart.

use std::fmt;

use marketplace_core::{
    AuthState, GuardOutcome, PublicGateOutcome, Role, RouteRequirement, authorize, gate_public,
};

/// Login and registration view.
pub const AUTH_PATH: &str = "/auth";

/// Where denied requests are sent. Not registered as a route; the wildcard
/// fallback serves it.
pub const NOT_FOUND_PATH: &str = "/not-found";

/// A subtree of the route table sharing one access rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    /// The login view, behind the public gate.
    Public,
    /// Shopper pages.
    User,
    /// Seller console.
    Seller,
    /// Admin console.
    Admin,
}

impl Area {
    /// Roles admitted to the area, `None` for the public gate.
    #[must_use]
    pub const fn requirement(self) -> Option<RouteRequirement> {
        match self {
            Self::Public => None,
            Self::User => Some(RouteRequirement::only(Role::User)),
            Self::Seller => Some(RouteRequirement::only(Role::Seller)),
            Self::Admin => Some(RouteRequirement::only(Role::Admin)),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::User => "user",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub method: &'static str,
    /// Path pattern in router syntax (`{param}` for captures).
    pub path: &'static str,
    pub area: Area,
    /// Menu label, for pages linked from the area's navigation.
    pub label: Option<&'static str>,
}

const fn page(path: &'static str, area: Area, label: &'static str) -> RouteEntry {
    RouteEntry {
        method: "GET",
        path,
        area,
        label: Some(label),
    }
}

const fn get(path: &'static str, area: Area) -> RouteEntry {
    RouteEntry {
        method: "GET",
        path,
        area,
        label: None,
    }
}

const fn post(path: &'static str, area: Area) -> RouteEntry {
    RouteEntry {
        method: "POST",
        path,
        area,
        label: None,
    }
}

/// Every routed endpoint except logout, health checks and static files.
pub const ROUTES: &[RouteEntry] = &[
    // Public
    get(AUTH_PATH, Area::Public),
    post(AUTH_PATH, Area::Public),
    post("/auth/register", Area::Public),
    // User
    page("/", Area::User, "Home"),
    page("/products", Area::User, "Shop"),
    get("/products/{category}", Area::User),
    get("/product/{product_id}", Area::User),
    page("/cart", Area::User, "Cart"),
    post("/cart/add", Area::User),
    post("/cart/remove", Area::User),
    get("/checkout", Area::User),
    post("/checkout", Area::User),
    page("/order", Area::User, "My Orders"),
    get("/invoice", Area::User),
    // Seller
    page("/store", Area::Seller, "Dashboard"),
    page("/manageproduct", Area::Seller, "Products"),
    post("/manageproduct/{product_id}/delete", Area::Seller),
    page("/orders", Area::Seller, "Orders"),
    post("/orders/status", Area::Seller),
    get("/orders/{order_id}/items/{index}/print", Area::Seller),
    page("/reviews", Area::Seller, "Reviews"),
    page("/chats", Area::Seller, "Chats"),
    page("/addproduct", Area::Seller, "Add Product"),
    post("/addproduct", Area::Seller),
    // Admin
    page("/admin", Area::Admin, "Dashboard"),
    page("/manage_product", Area::Admin, "Products"),
    page("/manage_user", Area::Admin, "Users"),
    page("/manage_seller", Area::Admin, "Sellers"),
    get("/reviews/{_id}", Area::Admin),
    page("/coupons", Area::Admin, "Coupons"),
    post("/coupons", Area::Admin),
    post("/coupons/{coupon_id}/delete", Area::Admin),
];

/// Landing page for a role after login.
#[must_use]
pub const fn home_for(role: Role) -> &'static str {
    match role {
        Role::User => "/",
        Role::Seller => "/store",
        Role::Admin => "/admin",
    }
}

const fn area_for(role: Role) -> Area {
    match role {
        Role::User => Area::User,
        Role::Seller => Area::Seller,
        Role::Admin => Area::Admin,
    }
}

/// A navigation link in a role's layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub path: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Menu for a role's layout, marking the link for `current_path`.
#[must_use]
pub fn menu_for(role: Role, current_path: &str) -> Vec<MenuItem> {
    let area = area_for(role);
    ROUTES
        .iter()
        .filter(|entry| entry.area == area)
        .filter_map(|entry| {
            entry.label.map(|label| MenuItem {
                path: entry.path,
                label,
                active: entry.path == current_path,
            })
        })
        .collect()
}

/// Whether a concrete path matches a route pattern.
fn matches_pattern(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with('{') && p.ends_with('}') => {
                if s.is_empty() {
                    return false;
                }
            }
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}

/// Find the route table entry a path belongs to.
///
/// The query string is ignored. Method is not considered: every method on a
/// path shares the path's area.
#[must_use]
pub fn find(path: &str) -> Option<&'static RouteEntry> {
    let path = path.split('?').next().unwrap_or(path);
    ROUTES
        .iter()
        .find(|entry| matches_pattern(entry.path, path))
}

/// What the storefront does with a request for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Serve the route.
    Render,
    /// Redirect to another path.
    Redirect(&'static str),
    /// Serve the not-found view.
    NotFound,
    /// The session must be resolved first.
    Pending,
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render => f.write_str("render"),
            Self::Redirect(to) => write!(f, "redirect {to}"),
            Self::NotFound => f.write_str("not found (404)"),
            Self::Pending => f.write_str("pending identity check"),
        }
    }
}

/// Decide a path for a session state without serving it.
#[must_use]
pub fn decide(state: AuthState, path: &str) -> RouteDecision {
    let Some(entry) = find(path) else {
        return RouteDecision::NotFound;
    };

    match entry.area.requirement() {
        None => match gate_public(state) {
            PublicGateOutcome::RenderLogin => RouteDecision::Render,
            PublicGateOutcome::RedirectHome(role) => RouteDecision::Redirect(home_for(role)),
            PublicGateOutcome::Pending => RouteDecision::Pending,
        },
        Some(requirement) => match authorize(state, requirement) {
            GuardOutcome::Render(_) => RouteDecision::Render,
            GuardOutcome::RedirectToAuth => RouteDecision::Redirect(AUTH_PATH),
            GuardOutcome::Denied => RouteDecision::Redirect(NOT_FOUND_PATH),
            GuardOutcome::Pending => RouteDecision::Pending,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find_matches_captures() {
        assert_eq!(find("/products/shirts").unwrap().path, "/products/{category}");
        assert_eq!(find("/product/p1").unwrap().path, "/product/{product_id}");
        assert_eq!(find("/reviews/p1").unwrap().area, Area::Admin);
        assert_eq!(find("/reviews").unwrap().area, Area::Seller);
        assert_eq!(find("/invoice?order_id=o1").unwrap().area, Area::User);
        assert!(find("/products/").is_none());
        assert!(find("/nope").is_none());
        assert!(find("/store/extra").is_none());
    }

    #[test]
    fn test_unauthenticated_store_goes_to_auth() {
        assert_eq!(
            decide(AuthState::Unauthenticated, "/store"),
            RouteDecision::Redirect(AUTH_PATH)
        );
    }

    #[test]
    fn test_user_admin_is_not_found() {
        assert_eq!(
            decide(AuthState::Authenticated(Role::User), "/admin"),
            RouteDecision::Redirect(NOT_FOUND_PATH)
        );
    }

    #[test]
    fn test_seller_orders_renders() {
        assert_eq!(
            decide(AuthState::Authenticated(Role::Seller), "/orders"),
            RouteDecision::Render
        );
    }

    #[test]
    fn test_auth_redirects_home_per_role() {
        for role in Role::ALL {
            assert_eq!(
                decide(AuthState::Authenticated(role), AUTH_PATH),
                RouteDecision::Redirect(home_for(role))
            );
        }
        assert_eq!(decide(AuthState::Unauthenticated, AUTH_PATH), RouteDecision::Render);
    }

    #[test]
    fn test_unmatched_path_is_not_found_for_every_state() {
        let states = [
            AuthState::Unauthenticated,
            AuthState::Unresolved,
            AuthState::Authenticated(Role::User),
            AuthState::Authenticated(Role::Seller),
            AuthState::Authenticated(Role::Admin),
        ];
        for state in states {
            assert_eq!(decide(state, "/does/not/exist"), RouteDecision::NotFound);
        }
    }

    #[test]
    fn test_every_home_is_in_its_roles_area() {
        for role in Role::ALL {
            assert_eq!(
                decide(AuthState::Authenticated(role), home_for(role)),
                RouteDecision::Render
            );
        }
    }

    #[test]
    fn test_menu_marks_active_link() {
        let menu = menu_for(Role::Seller, "/orders");
        assert_eq!(menu.len(), 6);
        let active: Vec<_> = menu.iter().filter(|m| m.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().unwrap().label, "Orders");
    }
}
