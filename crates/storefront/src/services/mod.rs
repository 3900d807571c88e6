//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Login, registration, logout and session resolution against
//!   the backend

pub mod auth;
