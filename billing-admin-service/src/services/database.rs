//! Database service for billing-admin-service.

use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::query::{ComposedQuery, QueryExecutor, SqlValue, StorageError};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use std::time::Duration;
use tracing::{info, instrument};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "billing-admin-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = Self::pool_options(max_connections, min_connections, acquire_timeout_secs)
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Create a pool that only connects when a connection is first acquired.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        acquire_timeout_secs: u64,
    ) -> Result<Self, AppError> {
        let pool = Self::pool_options(max_connections, 0, acquire_timeout_secs)
            .connect_lazy(database_url)
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Invalid database URL: {}", e))
            })?;

        Ok(Self { pool })
    }

    fn pool_options(
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
    ) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Check out one connection for the duration of a request.
    pub async fn session(&self) -> Result<PgSession, AppError> {
        let conn = self.pool.acquire().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to acquire database connection");
            AppError::DatabaseError(anyhow::anyhow!("Failed to acquire connection: {}", e))
        })?;

        Ok(PgSession { conn })
    }
}

/// A pooled connection held by a single request.
pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

impl PgSession {
    /// Run a write statement that returns the affected row's `id`.
    #[instrument(skip(self, query), fields(sql = %query.sql))]
    pub async fn fetch_id(
        &mut self,
        operation: &str,
        query: &ComposedQuery,
    ) -> Result<Option<i64>, sqlx::Error> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let row = bind_params(sqlx::query(&query.sql), &query.params)
            .fetch_optional(&mut *self.conn)
            .await?;

        timer.observe_duration();
        row.map(|r| r.try_get::<i64, _>("id")).transpose()
    }

    /// Run a statement and return the number of affected rows.
    #[instrument(skip(self, query), fields(sql = %query.sql))]
    pub async fn execute(
        &mut self,
        operation: &str,
        query: &ComposedQuery,
    ) -> Result<u64, sqlx::Error> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let result = bind_params(sqlx::query(&query.sql), &query.params)
            .execute(&mut *self.conn)
            .await?;

        timer.observe_duration();
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl QueryExecutor for PgSession {
    type Row = PgRow;

    #[instrument(skip(self, query), fields(sql = %query.sql))]
    async fn fetch_count(&mut self, query: &ComposedQuery) -> Result<i64, StorageError> {
        let timer = DB_QUERY_DURATION.with_label_values(&["count"]).start_timer();

        let row = bind_params(sqlx::query(&query.sql), &query.params)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(StorageError::new)?;
        let total = row.try_get::<i64, _>(0).map_err(StorageError::new)?;

        timer.observe_duration();
        Ok(total)
    }

    #[instrument(skip(self, query), fields(sql = %query.sql))]
    async fn fetch_rows(&mut self, query: &ComposedQuery) -> Result<Vec<PgRow>, StorageError> {
        let timer = DB_QUERY_DURATION.with_label_values(&["select"]).start_timer();

        let rows = bind_params(sqlx::query(&query.sql), &query.params)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(StorageError::new)?;

        timer.observe_duration();
        Ok(rows)
    }
}

/// Bind values in placeholder order.
fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Date(v) => query.bind(*v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }
    query
}
