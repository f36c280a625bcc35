//! CLI command implementations.

pub mod migrate;
pub mod product;

use sqlx::PgPool;
use thiserror::Error;

use souq_storefront::config::{ConfigError, get_database_url};
use souq_storefront::db::create_pool;

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] souq_core::PriceError),

    #[error(transparent)]
    Commerce(#[from] souq_storefront::services::CommerceError),
}

/// Connect to the storefront database named by the environment.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;

    tracing::info!("Connecting to storefront database...");
    Ok(create_pool(&database_url).await?)
}
