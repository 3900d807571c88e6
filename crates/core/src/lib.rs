//! Marketplace Core - Shared domain types.
//!
//! This crate provides the types used across the marketplace components:
//! - `storefront` - Server-rendered customer / seller / admin frontend
//! - `cli` - Operator tools (session store migrations, route inspection)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session storage. The route authorization rules live here so
//! the web layer and the CLI evaluate exactly the same decision.
//!
//! # Modules
//!
//! - [`types`] - Roles, authentication state, access decisions, IDs, prices,
//!   emails and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
