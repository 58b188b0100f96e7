//! Route table
//!
//! Every resource gets the same four routes under `/api/{path}`; the
//! handlers are shared and receive the resource's schema through the
//! closure that registers them.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{Method, Uri},
    routing::{get, put},
    Json, Router,
};
use serde_json::Value;

use crate::handlers::{resource, ApiError};
use crate::health;
use crate::schema;
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness));

    for schema in schema::ALL {
        router = router
            .route(
                &format!("/api/{}", schema.path),
                get(move |state: State<AppState>| resource::list(state, schema)).post(
                    move |state: State<AppState>, body: Result<Json<Value>, JsonRejection>| {
                        resource::create(state, schema, body)
                    },
                ),
            )
            .route(
                &format!("/api/{}/{{id}}", schema.path),
                put(
                    move |state: State<AppState>,
                          id: Result<Path<String>, PathRejection>,
                          body: Result<Json<Value>, JsonRejection>| {
                        resource::update(state, schema, id, body)
                    },
                )
                .delete(move |state: State<AppState>, id: Result<Path<String>, PathRejection>| {
                    resource::delete(state, schema, id)
                }),
            );
    }

    router
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state)
}

async fn not_found(State(state): State<AppState>, method: Method, uri: Uri) -> ApiError {
    ApiError::route_not_found(method.as_str(), uri.path()).with_environment(state.environment())
}
