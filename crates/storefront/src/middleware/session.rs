//! Session middleware configuration and flash helpers.
//!
//! Sessions are stored in `PostgreSQL` when a database is configured and in
//! memory otherwise; the layer is generic over the store.

use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;
use crate::models::{Toast, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "mp_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer over `store`.
///
/// # Arguments
///
/// * `store` - Session store (`PostgresStore` or `MemoryStore`)
/// * `config` - Storefront configuration (for the cookie's `Secure` flag)
#[must_use]
pub fn create_session_layer<S>(store: S, config: &StorefrontConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Queue a toast for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(
    session: &Session,
    toast: &Toast,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, toast).await
}

/// Take the queued toast, if any.
///
/// Store failures are logged and read as "no toast".
pub async fn take_flash(session: &Session) -> Option<Toast> {
    match session.remove::<Toast>(session_keys::FLASH).await {
        Ok(toast) => toast,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash message");
            None
        }
    }
}
