//! Session store migration.
//!
//! # Usage
//!
//! ```bash
//! mp-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string, falling back
//!   to `DATABASE_URL`

use secrecy::SecretString;
use thiserror::Error;

use marketplace_storefront::db;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Neither database variable is set.
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingEnvVar,

    /// Connection or migration failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create the `tower_sessions` schema and session table.
///
/// Safe to run repeatedly; existing tables are left as they are.
pub async fn sessions() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar)?;

    tracing::info!("Connecting to session database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Creating session table...");
    db::migrate(pool).await?;

    tracing::info!("Session store migration complete!");
    Ok(())
}
