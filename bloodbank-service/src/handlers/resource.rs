//! Generic CRUD handlers
//!
//! One implementation of list/create/update/delete shared by every
//! resource; the route table passes in the resource's schema.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::schema::{CreatedMessage, ResourceSchema};
use crate::state::AppState;
use crate::validation::{validate, Intent};

use super::error::{ApiError, ApiErrorKind, ApiOperation};
use super::response::{Created, Inserted, Message};
use super::translate::store_failure;

/// `GET /api/{resource}`
pub async fn list(
    State(state): State<AppState>,
    schema: &'static ResourceSchema,
) -> Result<Json<Vec<Value>>, ApiError> {
    let rows = state
        .store()
        .list(schema)
        .await
        .map_err(|e| store_failure(schema, ApiOperation::List, None, None, e))
        .map_err(|e| e.with_environment(state.environment()))?;

    tracing::debug!(resource = schema.path, rows = rows.len(), "Listed records");
    Ok(Json(rows))
}

/// `POST /api/{resource}`
pub async fn create(
    State(state): State<AppState>,
    schema: &'static ResourceSchema,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Created<Inserted>, ApiError> {
    create_record(&state, schema, body)
        .await
        .map_err(|e| e.with_environment(state.environment()))
}

/// `PUT /api/{resource}/{id}`
pub async fn update(
    State(state): State<AppState>,
    schema: &'static ResourceSchema,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Message, ApiError> {
    let result = match path_id(schema, ApiOperation::Update, id) {
        Ok(id) => update_record(&state, schema, &id, body).await,
        Err(e) => Err(e),
    };
    result.map_err(|e| e.with_environment(state.environment()))
}

/// `DELETE /api/{resource}/{id}`
pub async fn delete(
    State(state): State<AppState>,
    schema: &'static ResourceSchema,
    id: Result<Path<String>, PathRejection>,
) -> Result<Message, ApiError> {
    let result = match path_id(schema, ApiOperation::Delete, id) {
        Ok(id) => delete_record(&state, schema, &id).await,
        Err(e) => Err(e),
    };
    result.map_err(|e| e.with_environment(state.environment()))
}

async fn create_record(
    state: &AppState,
    schema: &'static ResourceSchema,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Created<Inserted>, ApiError> {
    let payload = json_body(schema, ApiOperation::Create, body)?;
    let record = validate(schema, &payload, Intent::Create)
        .map_err(|e| ApiError::validation(ApiOperation::Create, e.message).with_resource(schema.path))?;

    state
        .store()
        .insert(&record)
        .await
        .map_err(|e| store_failure(schema, ApiOperation::Create, Some(&record), None, e))?;

    let id = record.key();
    let message = match schema.created {
        CreatedMessage::Titled(field) => format!(
            "{} '{}' created successfully.",
            schema.label,
            record.display(field)
        ),
        CreatedMessage::Fixed(text) => text.to_string(),
    };
    tracing::info!(resource = schema.path, id = %id, "Record created");

    Ok(Created::new(Inserted {
        message,
        inserted_id: id.clone(),
    })
    .with_location(format!("/api/{}/{}", schema.path, id)))
}

async fn update_record(
    state: &AppState,
    schema: &'static ResourceSchema,
    id: &str,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Message, ApiError> {
    let payload = json_body(schema, ApiOperation::Update, body)?;
    let record = validate(schema, &payload, Intent::Update { id })
        .map_err(|e| ApiError::validation(ApiOperation::Update, e.message).with_resource(schema.path))?;

    let affected = state
        .store()
        .replace(&record)
        .await
        .map_err(|e| store_failure(schema, ApiOperation::Update, Some(&record), Some(id), e))?;

    if affected == 0 {
        return Err(not_found(schema, ApiOperation::Update, id));
    }

    tracing::info!(resource = schema.path, id = %id, "Record updated");
    Ok(Message::new(format!("{} '{}' updated successfully.", schema.label, id)))
}

async fn delete_record(
    state: &AppState,
    schema: &'static ResourceSchema,
    id: &str,
) -> Result<Message, ApiError> {
    let affected = state
        .store()
        .delete(schema, id)
        .await
        .map_err(|e| store_failure(schema, ApiOperation::Delete, None, Some(id), e))?;

    if affected == 0 {
        return Err(not_found(schema, ApiOperation::Delete, id));
    }

    tracing::info!(resource = schema.path, id = %id, "Record deleted");
    Ok(Message::new(format!("{} '{}' deleted successfully.", schema.label, id)))
}

fn json_body(
    schema: &'static ResourceSchema,
    operation: ApiOperation,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        let error = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(
                operation,
                ApiErrorKind::PayloadTooLarge,
                "Request body is too large.",
            )
        } else {
            ApiError::validation(
                operation,
                format!("Request body must be valid JSON: {}", rejection.body_text()),
            )
        };
        error.with_resource(schema.path)
    })
}

fn path_id(
    schema: &'static ResourceSchema,
    operation: ApiOperation,
    id: Result<Path<String>, PathRejection>,
) -> Result<String, ApiError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        ApiError::validation(
            operation,
            format!("Invalid {} ID in path: {}", schema.noun, rejection.body_text()),
        )
        .with_resource(schema.path)
    })
}

fn not_found(schema: &'static ResourceSchema, operation: ApiOperation, id: &str) -> ApiError {
    ApiError::new(
        operation,
        ApiErrorKind::NotFound,
        format!("{} with ID '{}' not found.", schema.label, id),
    )
    .with_resource(schema.path)
}
