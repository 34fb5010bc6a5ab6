//! PostgreSQL implementation of the store backend.

use std::str::FromStr;
use std::time::Duration;

use futures_util::future::BoxFuture;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use super::KvBackend;
use crate::config::GatewayConfig;
use crate::error::{ConfigError, StartupError, StoreError};

const UPSERT_SQL: &str = "INSERT INTO kv_store (key, value, updated_at) VALUES ($1, $2, now()) \
     ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Creates a backend over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the connection pool described by `config`.
    ///
    /// Connects eagerly, so an unreachable server fails here.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Config`] for an unparseable URL and
    /// [`StartupError::StoreUnavailable`] when no connection can be made.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, StartupError> {
        let options =
            PgConnectOptions::from_str(&config.database_url).map_err(|e| ConfigError::Invalid {
                key: "DATABASE_URL",
                reason: e.to_string(),
            })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| StartupError::StoreUnavailable(StoreError::Database(e)))?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "database pool created"
        );
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Migration`] if any migration fails.
    pub async fn migrate(&self) -> Result<(), StartupError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

impl KvBackend for PostgresBackend {
    fn upsert<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<u64, StoreError>> {
        Box::pin(async move {
            let result = sqlx::query(UPSERT_SQL)
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.pool.close().await })
    }
}
