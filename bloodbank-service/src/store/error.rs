//! Store error types
//!
//! Every failure of a store call is reported as a [`StoreError`] carrying
//! the operation, a classified [`StoreErrorKind`] and, for constraint
//! violations, the constraint and column the database named. Callers decide
//! what a failure means by matching on `kind`, never on `message`.

use std::fmt;

/// Store operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Establishing the pool
    Connect,
    /// Health probe
    Ping,
    /// Applying schema migrations
    Migrate,
    /// Listing a resource
    List,
    /// Inserting a record
    Insert,
    /// Replacing a record by primary key
    Replace,
    /// Deleting a record by primary key
    Delete,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Ping => write!(f, "ping"),
            Self::Migrate => write!(f, "migrate"),
            Self::List => write!(f, "list"),
            Self::Insert => write!(f, "insert"),
            Self::Replace => write!(f, "replace"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Primary key or unique column collision
    UniqueViolation,
    /// Referenced row missing, or referencing rows block a delete
    ForeignKeyViolation,
    /// Check constraint rejected a value
    CheckViolation,
    /// NULL written to a NOT NULL column
    NotNullViolation,
    /// Could not reach the database
    ConnectionFailed,
    /// Statement or acquire timed out
    Timeout,
    /// No connection available and the wait queue is full
    PoolExhausted,
    /// Statement failed for another reason
    QueryFailed,
    /// Other/unknown error
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UniqueViolation => write!(f, "unique_violation"),
            Self::ForeignKeyViolation => write!(f, "foreign_key_violation"),
            Self::CheckViolation => write!(f, "check_violation"),
            Self::NotNullViolation => write!(f, "not_null_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::PoolExhausted => write!(f, "pool_exhausted"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured store error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The operation being performed when the error occurred
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Driver message, for logs only
    pub message: String,
    /// Violated constraint, when reported
    pub constraint: Option<String>,
    /// Offending column, when reported
    pub column: Option<String>,
}

impl StoreError {
    pub fn new(
        operation: StoreOperation,
        kind: StoreErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            constraint: None,
            column: None,
        }
    }

    /// A constraint violation naming the constraint that fired
    pub fn violation(
        operation: StoreOperation,
        kind: StoreErrorKind,
        constraint: impl Into<String>,
    ) -> Self {
        let constraint = constraint.into();
        Self {
            operation,
            kind,
            message: format!("constraint \"{constraint}\" violated"),
            constraint: Some(constraint),
            column: None,
        }
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            StoreOperation::Connect,
            StoreErrorKind::ConnectionFailed,
            message,
        )
    }

    pub fn pool_exhausted(operation: StoreOperation) -> Self {
        Self::new(
            operation,
            StoreErrorKind::PoolExhausted,
            "store wait queue is full",
        )
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: Option<impl Into<String>>) -> Self {
        self.constraint = constraint.map(Into::into);
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: Option<impl Into<String>>) -> Self {
        self.column = column.map(Into::into);
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: StoreOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Transient failures that may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ConnectionFailed | StoreErrorKind::Timeout | StoreErrorKind::PoolExhausted
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref constraint) = self.constraint {
            write!(f, " [constraint: {}]", constraint)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}
