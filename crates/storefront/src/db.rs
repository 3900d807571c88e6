//! `PostgreSQL` access for the session store.
//!
//! The storefront keeps no business data of its own: products, carts and
//! orders live behind the backend API. The only table is the
//! `tower_sessions.session` table, created by
//! ```bash
//! cargo run -p marketplace-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions_sqlx_store::PostgresStore;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Session store over `pool`.
#[must_use]
pub fn session_store(pool: PgPool) -> PostgresStore {
    PostgresStore::new(pool)
}

/// Create the session schema and table if missing.
///
/// # Errors
///
/// Returns `sqlx::Error` if the migration fails.
pub async fn migrate(pool: PgPool) -> Result<(), sqlx::Error> {
    session_store(pool).migrate().await
}
