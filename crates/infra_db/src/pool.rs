//! Connection pool and schema migrations
//!
//! Every ledger operation holds one pooled connection for the length of its
//! transaction and may wait on folio or invoice row locks. The pool is sized
//! from [`DatabaseConfig`], and each connection carries a `lock_timeout` so
//! a request stuck behind a long-held folio lock fails instead of hanging.

use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use crate::error::DatabaseError;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// The `database` section of the service configuration
///
/// ```toml
/// [database]
/// url = "postgres://localhost/folio_ledger"
/// max_connections = 10
/// lock_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a request waits for a free connection
    pub acquire_timeout_secs: u64,
    /// How long a statement waits for a row lock; zero waits forever
    pub lock_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/folio_ledger".to_string(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 30,
            lock_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    /// Default settings against `url`
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.max_connections == 0 {
            return Err(DatabaseError::ConnectionFailed(
                "max_connections must be at least 1".into(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(DatabaseError::ConnectionFailed(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    fn connect_options(&self) -> Result<PgConnectOptions, DatabaseError> {
        let options: PgConnectOptions = self
            .url
            .parse()
            .map_err(|e: sqlx::Error| DatabaseError::ConnectionFailed(e.to_string()))?;
        let lock_timeout = self.lock_timeout_ms.to_string();
        Ok(options.options([("lock_timeout", lock_timeout.as_str())]))
    }
}

/// Creates the connection pool
///
/// # Errors
///
/// `DatabaseError::ConnectionFailed` for invalid settings, an unparsable
/// URL, or when no connection can be opened.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    config.validate()?;
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        lock_timeout_ms = config.lock_timeout_ms,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(config.connect_options()?)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Database pool created");
    Ok(pool)
}

/// Applies the embedded schema migrations
///
/// Migrations live in `crates/infra_db/migrations` and are compiled into
/// the binary; already applied versions are skipped.
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
    info!("Database migrations applied");
    Ok(())
}
