//! API error types for handler operations
//!
//! Every failed request ends as an [`ApiError`]: a closed [`ApiErrorKind`]
//! with a fixed HTTP status plus a resource-aware message. The response body
//! is always `{"message": ..., "errorType": ...}`; `errorType` and the
//! wording of 5xx messages depend on the deployment [`Environment`].

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::Environment;

/// Client-facing text for any 5xx in production-like environments
pub const SANITIZED_MESSAGE: &str = "An internal server error occurred. Please try again later.";

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing a resource
    List,
    /// Creating a record
    Create,
    /// Replacing a record
    Update,
    /// Deleting a record
    Delete,
    /// Matching a route
    Route,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Route => write!(f, "route"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Missing or malformed field, or a rejected domain value
    ValidationError,
    /// Foreign key names a row that does not exist
    InvalidReference,
    /// Primary key or unique column already taken
    DuplicateKey,
    /// No such record or route
    NotFound,
    /// Delete blocked by referencing rows
    ReferentialConflict,
    /// Request body over the configured limit
    PayloadTooLarge,
    /// Anything else
    InternalError,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_type())
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError | Self::InvalidReference => StatusCode::BAD_REQUEST,
            Self::DuplicateKey | Self::ReferentialConflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Name reported as `errorType`
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::InvalidReference => "InvalidReference",
            Self::DuplicateKey => "DuplicateKey",
            Self::NotFound => "NotFound",
            Self::ReferentialConflict => "ReferentialConflict",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::InternalError => "InternalError",
        }
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Client-facing message
    pub message: String,
    /// Resource path, when the error belongs to one
    pub resource: Option<&'static str>,
    /// Underlying cause; logged, never sent
    pub detail: Option<String>,
    /// Decides 5xx wording and whether `errorType` is sent
    pub environment: Environment,
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
}

impl ApiError {
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            resource: None,
            detail: None,
            environment: Environment::default(),
        }
    }

    pub fn validation(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::ValidationError, message)
    }

    /// Unmatched method and path
    pub fn route_not_found(method: &str, path: &str) -> Self {
        Self::new(
            ApiOperation::Route,
            ApiErrorKind::NotFound,
            format!("API route not found: {method} {path}"),
        )
    }

    #[must_use]
    pub fn with_resource(mut self, resource: &'static str) -> Self {
        self.resource = Some(resource);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Body as the client will see it
    pub fn body(&self) -> ErrorBody {
        let production = self.environment.is_production_like();
        let message = if production && self.kind.status_code().is_server_error() {
            SANITIZED_MESSAGE.to_string()
        } else {
            self.message.clone()
        };
        ErrorBody {
            message,
            error_type: (!production).then(|| self.kind.error_type()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(resource) = self.resource {
            write!(f, " [{}]", resource)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                resource = ?self.resource,
                detail = ?self.detail,
                "API error: {}", self.message
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                kind = %self.kind,
                resource = ?self.resource,
                "API error: {}", self.message
            );
        }

        (status, Json(self.body())).into_response()
    }
}
