//! PostgreSQL-backed user store.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{ConnectOptions, Connection, PgPool};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::StoreError;

use super::types::{User, ValidNewUser};
use super::UserStore;

/// User store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build the pool from configuration without opening a connection yet.
    ///
    /// Connections are established on first use, so the service starts even
    /// when the store is down and reports it through the health check.
    pub fn connect_lazy(config: &Config) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy_with(config.connect_options());

        debug!(
            max_connections = config.db_max_connections,
            "PostgreSQL pool created"
        );

        Self::new(pool)
    }

    /// Underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Convert a driver result, recovering the real connect error when the
    /// pool gave up without ever opening a connection.
    async fn settle<T>(&self, result: Result<T, sqlx::Error>) -> Result<T, StoreError> {
        match result {
            Ok(value) => Ok(value),
            Err(sqlx::Error::PoolTimedOut) if self.pool.size() == 0 => {
                let err = self.connect_error().await.unwrap_or(sqlx::Error::PoolTimedOut);
                Err(err.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open one connection outside the pool and return why it failed, if it did.
    async fn connect_error(&self) -> Option<sqlx::Error> {
        let timeout = self.pool.options().get_acquire_timeout();
        let options = self.pool.connect_options();

        match tokio::time::timeout(timeout, options.connect()).await {
            Ok(Err(e)) => Some(e),
            Ok(Ok(conn)) => {
                if let Err(e) = conn.close().await {
                    debug!(error = %e, "failed to close diagnostic connection");
                }
                None
            }
            Err(_) => None,
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        let result = sqlx::query("SELECT NOW()").execute(&self.pool).await;
        self.settle(result).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let result = sqlx::query_as::<_, User>("SELECT id, name, email FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await;
        self.settle(result).await
    }

    #[instrument(skip(self, user))]
    async fn insert(&self, user: &ValidNewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id, name, email",
        )
        .bind(user.name())
        .bind(user.email())
        .fetch_one(&self.pool)
        .await;
        let created = self.settle(result).await?;

        debug!(id = created.id, "user inserted");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find(&self, id: i32) -> Result<Option<User>, StoreError> {
        let result = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        self.settle(result).await
    }
}
