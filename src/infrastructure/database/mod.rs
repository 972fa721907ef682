pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::{SeaOrmCardRepository, SeaOrmUserRepository};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde::Deserialize;
use tracing::info;

use crate::shared::{retry_with_backoff, RetryConfig};

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./cardbank.db?mode=rwc"), or `memory://`
    /// for the in-memory repositories
    pub url: String,
    pub connect_retry: RetryConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./cardbank.db?mode=rwc".to_string(),
            connect_retry: RetryConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }

    /// URL scheme only; the full URL may carry credentials.
    pub fn backend(&self) -> &str {
        self.url.split("://").next().unwrap_or("unknown")
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!(backend = config.backend(), "Connecting to database");
    let mut options = ConnectOptions::new(config.url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    info!("Database connected successfully");
    Ok(db)
}

/// Only connection-level failures are worth waiting out; a bad URL or a
/// missing driver will not fix itself.
fn is_connection_error(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

/// [`init_database`] on the `connect_retry` schedule.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    retry_with_backoff(
        config.connect_retry,
        || init_database(config),
        is_connection_error,
        "connect_database",
    )
    .await
}
