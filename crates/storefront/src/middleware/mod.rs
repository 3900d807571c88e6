//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span)
//! 4. Security headers
//! 5. Session layer (tower-sessions)
//! 6. Route guards (per subtree, as route layers)
//! 7. Rate limiting (login and registration only)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthRejection, GuardState, RequireSession, public_gate, require_role};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, set_flash, take_flash};
