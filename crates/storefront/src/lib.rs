//! Marketplace storefront library.
//!
//! Server-rendered frontend for shoppers, sellers and admins. Every page is
//! composed from calls to the marketplace backend API; the storefront owns
//! only the session and the route authorization decision.
//!
//! The crate is a library so the integration tests and the CLI can build
//! the same router and route table the binary serves.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod services;
pub mod state;
