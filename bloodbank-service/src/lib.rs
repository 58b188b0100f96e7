//! # bloodbank-service
//!
//! REST API over a PostgreSQL blood bank database: blood types, hospitals,
//! donors, recipients, and the donation and transfusion transactions that
//! link them.
//!
//! ## Features
//!
//! - **Uniform CRUD**: list, create, update, and delete under `/api/{resource}`
//! - **Validation**: required fields, age and date rules checked before the database is touched
//! - **Error mapping**: constraint violations become 400/404/409 responses naming the offending field
//! - **Sanitized failures**: 5xx details are logged, never sent, in staging and production
//! - **Health checks**: liveness and readiness probes
//! - **Graceful shutdown**: SIGTERM/SIGINT drain in-flight requests before the pool closes
//!
//! ## Example
//!
//! ```rust,no_run
//! use bloodbank_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config);
//!
//!     Server::new(config).run().await
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod schema;
pub mod server;
pub mod state;
pub mod store;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, Environment, MiddlewareConfig, ServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiOperation};
    pub use crate::health::{health, readiness};
    pub use crate::lifecycle::{Lifecycle, Phase};
    pub use crate::observability::init_tracing;
    pub use crate::routes::router;
    pub use crate::schema::ResourceSchema;
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{PgStore, RecordStore, StoreError, StoreErrorKind};
}
