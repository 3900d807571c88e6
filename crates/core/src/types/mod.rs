//! Core types for the marketplace.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod access;
pub mod auth;
pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;

pub use access::{GuardOutcome, PublicGateOutcome, RouteRequirement, authorize, gate_public};
pub use auth::{AuthState, SessionEvent};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use role::{ParseRoleError, Role, RoleSet};
pub use status::*;
