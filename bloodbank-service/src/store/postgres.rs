//! PostgreSQL-backed [`RecordStore`]

use async_trait::async_trait;
use serde_json::Value;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgArguments, PgDatabaseError, PgPool};
use sqlx::query::Query;
use sqlx::Postgres;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::{sql, FieldValue, Record, RecordStore, StoreError, StoreErrorKind, StoreOperation};
use crate::schema::{FieldKind, ResourceSchema};

/// sqlx pool plus an optional admission gate bounding the wait queue
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    admission: Option<Arc<Semaphore>>,
}

impl PgStore {
    /// Wrap a pool; `admission_limit` caps in-flight calls (connections plus waiters)
    pub fn new(pool: PgPool, admission_limit: Option<usize>) -> Self {
        Self {
            pool,
            admission: admission_limit.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn admit(&self, operation: StoreOperation) -> Result<Option<OwnedSemaphorePermit>, StoreError> {
        match &self.admission {
            None => Ok(None),
            Some(gate) => gate
                .clone()
                .try_acquire_owned()
                .map(Some)
                .map_err(|_| StoreError::pool_exhausted(operation)),
        }
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    kind: FieldKind,
    value: &FieldValue,
) -> Query<'q, Postgres, PgArguments> {
    match (value, kind) {
        (FieldValue::Text(s), _) => query.bind(s.clone()),
        (FieldValue::Integer(n), _) => query.bind(*n),
        (FieldValue::Date(d), _) => query.bind(*d),
        (FieldValue::Null, FieldKind::Text) => query.bind(None::<String>),
        (FieldValue::Null, FieldKind::Integer { .. }) => query.bind(None::<i64>),
        (FieldValue::Null, FieldKind::Date) => query.bind(None::<chrono::NaiveDate>),
    }
}

fn bind_record<'q>(stmt: &'q sql::Statement, record: &Record) -> Query<'q, Postgres, PgArguments> {
    let mut query = sqlx::query(&stmt.sql);
    for &i in &stmt.binds {
        query = bind_value(query, record.schema.fields[i].kind, &record.values[i]);
    }
    query
}

#[async_trait]
impl RecordStore for PgStore {
    async fn list(&self, schema: &'static ResourceSchema) -> Result<Vec<Value>, StoreError> {
        let _permit = self.admit(StoreOperation::List)?;
        sqlx::query_scalar::<_, Value>(&sql::list(schema))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(StoreOperation::List, e))
    }

    async fn insert(&self, record: &Record) -> Result<(), StoreError> {
        let _permit = self.admit(StoreOperation::Insert)?;
        let stmt = sql::insert(record.schema);
        bind_record(&stmt, record)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| classify(StoreOperation::Insert, e))
    }

    async fn replace(&self, record: &Record) -> Result<u64, StoreError> {
        let _permit = self.admit(StoreOperation::Replace)?;
        let stmt = sql::replace(record.schema);
        bind_record(&stmt, record)
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected())
            .map_err(|e| classify(StoreOperation::Replace, e))
    }

    async fn delete(&self, schema: &'static ResourceSchema, id: &str) -> Result<u64, StoreError> {
        let _permit = self.admit(StoreOperation::Delete)?;
        sqlx::query(&sql::delete(schema))
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected())
            .map_err(|e| classify(StoreOperation::Delete, e))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| classify(StoreOperation::Ping, e))
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

/// Classify a driver error by its structured fields
pub(crate) fn classify(operation: StoreOperation, err: sqlx::Error) -> StoreError {
    use sqlx::Error as E;
    match err {
        E::Database(db) => {
            let kind = match db.kind() {
                ErrorKind::UniqueViolation => StoreErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => StoreErrorKind::ForeignKeyViolation,
                ErrorKind::CheckViolation => StoreErrorKind::CheckViolation,
                ErrorKind::NotNullViolation => StoreErrorKind::NotNullViolation,
                _ => match db.code().as_deref() {
                    // query_canceled: statement_timeout fired
                    Some("57014") => StoreErrorKind::Timeout,
                    _ => StoreErrorKind::QueryFailed,
                },
            };

            let pg = db.try_downcast_ref::<PgDatabaseError>();
            let column = pg
                .and_then(|e| e.column().map(str::to_string))
                .or_else(|| pg.and_then(|e| e.detail()).and_then(detail_column));

            StoreError::new(operation, kind, db.message())
                .with_constraint(db.constraint())
                .with_column(column)
        }
        E::PoolTimedOut => StoreError::new(
            operation,
            StoreErrorKind::Timeout,
            "timed out waiting for a database connection",
        ),
        E::PoolClosed => StoreError::new(
            operation,
            StoreErrorKind::ConnectionFailed,
            "connection pool is closed",
        ),
        E::Io(e) => StoreError::new(operation, StoreErrorKind::ConnectionFailed, e.to_string()),
        E::Tls(e) => StoreError::new(
            operation,
            StoreErrorKind::ConnectionFailed,
            format!("TLS error: {e}"),
        ),
        E::Configuration(e) => StoreError::new(operation, StoreErrorKind::Other, e.to_string()),
        E::WorkerCrashed => StoreError::new(
            operation,
            StoreErrorKind::ConnectionFailed,
            "database worker crashed",
        ),
        E::Protocol(msg) => StoreError::new(operation, StoreErrorKind::QueryFailed, msg),
        other => StoreError::new(operation, StoreErrorKind::Other, other.to_string()),
    }
}

/// First column named in a PostgreSQL detail line such as
/// `Key (blood_type_id)=(Z+) is not present in table "blood_type".`
pub(crate) fn detail_column(detail: &str) -> Option<String> {
    let start = detail.find("Key (")? + "Key (".len();
    let rest = &detail[start..];
    let end = rest.find(')')?;
    rest[..end]
        .split(',')
        .next()
        .map(|c| c.trim().trim_matches('"').to_string())
        .filter(|c| !c.is_empty())
}
