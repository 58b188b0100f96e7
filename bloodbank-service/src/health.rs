//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::handlers::Message;
use crate::lifecycle::Phase;
use crate::state::AppState;

/// Text served at `/`
pub const LIVENESS_MESSAGE: &str = "Blood Bank Management System API is active!";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response with dependency status
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Current lifecycle phase
    pub phase: Phase,

    /// Dependency statuses
    pub dependencies: HashMap<String, DependencyStatus>,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /`
pub async fn root() -> Message {
    Message::new(LIVENESS_MESSAGE)
}

/// Simple health check (liveness probe)
///
/// Always returns 200 OK while the process is serving.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check (readiness probe)
///
/// 200 only while the lifecycle is Ready and the store answers `SELECT 1`;
/// 503 otherwise, including while draining.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let phase = state.lifecycle().phase();
    let mut dependencies = HashMap::new();

    let database = match state.store().ping().await {
        Ok(()) => DependencyStatus {
            healthy: true,
            message: Some("Connected".to_string()),
        },
        Err(e) => {
            tracing::error!(kind = %e.kind, "Database health check failed: {}", e);
            let message = if state.environment().is_production_like() {
                "Unavailable".to_string()
            } else {
                format!("Connection failed: {}", e.message)
            };
            DependencyStatus {
                healthy: false,
                message: Some(message),
            }
        }
    };

    let ready = phase == Phase::Ready && database.healthy;
    dependencies.insert("database".to_string(), database);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            service: state.config().service.name.clone(),
            phase,
            dependencies,
        }),
    )
}
