//! Database connection pool management

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::store::{postgres::classify, StoreError, StoreOperation};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Create a PostgreSQL connection pool with retry logic
///
/// The pool is only returned once a `SELECT 1` round trip has succeeded, so
/// an unreachable database is reported at startup rather than on the first
/// request. Uses exponential backoff between attempts.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        max = config.max_connections,
                        min = config.min_connections,
                        queue_limit = config.queue_limit,
                        "Database connection pool created"
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if !e.is_retriable() {
                    tracing::error!(
                        url = %sanitize_connection_url(&config.url),
                        kind = %e.kind,
                        "Database connection failed permanently: {}",
                        e
                    );
                    return Err(e);
                }

                if attempt > config.max_retries {
                    tracing::error!(
                        url = %sanitize_connection_url(&config.url),
                        "Failed to connect to database after {} attempt(s): {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));
                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Single connection attempt followed by a connectivity probe
async fn try_create_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let mut options: PgConnectOptions = config
        .url
        .parse()
        .map_err(|e| classify(StoreOperation::Connect, e))?;

    if let Some(timeout) = config.statement_timeout() {
        options = options.options([("statement_timeout", format!("{}", timeout.as_millis()))]);
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await
        .map_err(|e| {
            let err = classify(StoreOperation::Connect, e);
            StoreError {
                message: format!(
                    "Failed to connect to database at '{}': {}",
                    sanitize_connection_url(&config.url),
                    err.message
                ),
                ..err
            }
        })?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| classify(StoreOperation::Ping, e))?;

    Ok(pool)
}

/// Apply the bundled schema migrations
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    MIGRATOR.run(pool).await.map_err(|e| {
        StoreError::new(
            StoreOperation::Migrate,
            crate::store::StoreErrorKind::QueryFailed,
            e.to_string(),
        )
    })?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Sanitize connection URL for safe logging (remove password)
pub(crate) fn sanitize_connection_url(url: &str) -> String {
    if let (Some(at_pos), Some(scheme_end)) = (url.rfind('@'), url.find("://")) {
        let credentials = &url[scheme_end + 3..at_pos];
        if let Some(colon_pos) = credentials.find(':') {
            return format!(
                "{}{}:***{}",
                &url[..scheme_end + 3],
                &credentials[..colon_pos],
                &url[at_pos..]
            );
        }
    }
    url.to_string()
}
