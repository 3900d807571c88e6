//! Session-held models for the storefront.

pub mod session;

pub use session::{CurrentSession, SessionRecord, Toast, ToastKind, keys as session_keys};
