//! HTTP handlers for the resource endpoints
//!
//! - [`resource`]: list/create/update/delete shared by every resource
//! - [`translate`]: store failures to [`ApiError`]s
//! - [`error`]: the [`ApiError`] taxonomy and its JSON rendering
//! - [`response`]: success bodies

pub mod error;
pub mod resource;
pub mod response;
pub mod translate;

pub use error::{ApiError, ApiErrorKind, ApiOperation, ErrorBody, SANITIZED_MESSAGE};
pub use response::{Created, Inserted, Message};
