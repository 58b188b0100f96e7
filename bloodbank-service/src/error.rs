//! Process-level error types
//!
//! These cover startup and shutdown: configuration, store connectivity,
//! migrations, the listener and lifecycle transitions. Per-request failures
//! never reach this type; they are translated into [`crate::handlers::ApiError`].

use thiserror::Error;

use crate::lifecycle::Phase;
use crate::store::StoreError;

/// Result alias for startup and shutdown paths
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Store connectivity or migration failure
    #[error("{0}")]
    Database(StoreError),

    /// I/O error (listener bind, accept loop)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected lifecycle transition
    #[error("Invalid lifecycle transition from {from} to {to}")]
    Lifecycle { from: Phase, to: Phase },
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Database(err)
    }
}
