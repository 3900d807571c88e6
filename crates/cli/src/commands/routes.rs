//! Route table inspection.
//!
//! Both commands read the same table and guard functions the storefront
//! router is built from.

use std::str::FromStr;

use thiserror::Error;

use marketplace_core::{AuthState, Role};
use marketplace_storefront::navigation::{self, Area, RouteEntry};

/// Errors from route commands.
#[derive(Debug, Error)]
pub enum RoutesError {
    #[error("Invalid role: {0}. Valid roles: user, seller, admin, none, unresolved")]
    InvalidRole(String),

    #[error("Invalid area: {0}. Valid areas: public, user, seller, admin")]
    InvalidArea(String),

    #[error("Path must start with '/': {0}")]
    InvalidPath(String),
}

/// Print the route table, optionally limited to one area.
pub fn list(area: Option<&str>) -> Result<(), RoutesError> {
    let area = area.map(parse_area).transpose()?;

    #[allow(clippy::print_stdout)]
    for entry in navigation::ROUTES
        .iter()
        .filter(|entry| area.is_none_or(|area| entry.area == area))
    {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// Print what the storefront does with `path` for the given session state.
pub fn check(role: &str, path: &str) -> Result<(), RoutesError> {
    let state = parse_state(role)?;
    if !path.starts_with('/') {
        return Err(RoutesError::InvalidPath(path.to_owned()));
    }

    let area = navigation::find(path).map_or("-", |entry| entry.area.as_str());

    #[allow(clippy::print_stdout)]
    {
        println!("{path} [{area}] as {role}: {}", navigation::decide(state, path));
    }
    Ok(())
}

fn parse_state(role: &str) -> Result<AuthState, RoutesError> {
    match role {
        "none" => Ok(AuthState::Unauthenticated),
        "unresolved" => Ok(AuthState::Unresolved),
        other => Role::from_str(other)
            .map(AuthState::Authenticated)
            .map_err(|_| RoutesError::InvalidRole(other.to_owned())),
    }
}

fn parse_area(area: &str) -> Result<Area, RoutesError> {
    match area {
        "public" => Ok(Area::Public),
        "user" => Ok(Area::User),
        "seller" => Ok(Area::Seller),
        "admin" => Ok(Area::Admin),
        other => Err(RoutesError::InvalidArea(other.to_owned())),
    }
}

fn format_entry(entry: &RouteEntry) -> String {
    format!(
        "{:<6} {:<32} {:<7} {}",
        entry.method,
        entry.path,
        entry.area,
        entry.label.unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state() {
        assert_eq!(parse_state("none").ok(), Some(AuthState::Unauthenticated));
        assert_eq!(
            parse_state("seller").ok(),
            Some(AuthState::Authenticated(Role::Seller))
        );
        assert!(matches!(
            parse_state("guest"),
            Err(RoutesError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_parse_area() {
        assert_eq!(parse_area("admin").ok(), Some(Area::Admin));
        assert!(parse_area("staff").is_err());
    }

    #[test]
    fn test_check_rejects_relative_path() {
        assert!(matches!(
            check("user", "orders"),
            Err(RoutesError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_format_entry_columns() {
        let entry = navigation::find("/orders").map(format_entry);
        assert!(entry.is_some_and(|line| line.starts_with("GET    /orders ")));
    }
}
