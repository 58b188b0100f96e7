//! Store failure → API error translation
//!
//! A violation is tied back to a field in a fixed order: the constraint name
//! the database reported, then the reported column, then (foreign keys only)
//! the single foreign key of the record that carries a value. If none of
//! these settle it, a generic message of the same kind is used.

use crate::schema::{ConstraintKind, FieldSpec, ResourceSchema};
use crate::store::{Record, StoreError, StoreErrorKind};

use super::error::{ApiError, ApiErrorKind, ApiOperation};

/// Translate a failed store call for `schema`
///
/// `record` is the validated payload of a create or update; `id` is the path
/// key of an update or delete.
pub fn store_failure(
    schema: &'static ResourceSchema,
    operation: ApiOperation,
    record: Option<&Record>,
    id: Option<&str>,
    err: StoreError,
) -> ApiError {
    let translated = match err.kind {
        StoreErrorKind::UniqueViolation => duplicate(schema, operation, record, &err),
        StoreErrorKind::ForeignKeyViolation if operation == ApiOperation::Delete => {
            ApiError::new(
                operation,
                ApiErrorKind::ReferentialConflict,
                format!(
                    "Cannot delete {} '{}'. It is referenced by {}.",
                    schema.label,
                    id.unwrap_or_default(),
                    schema.dependents
                ),
            )
        }
        StoreErrorKind::ForeignKeyViolation => invalid_reference(schema, operation, record, &err),
        StoreErrorKind::CheckViolation => {
            let message = resolve(schema, &err, &[ConstraintKind::Check])
                .map(|field| {
                    field
                        .rule_message
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{} is invalid.", field.label))
                })
                .unwrap_or_else(|| "Invalid value provided.".to_string());
            ApiError::validation(operation, message)
        }
        StoreErrorKind::NotNullViolation => {
            let message = resolve(schema, &err, &[])
                .map(|field| format!("{} is required.", field.label))
                .unwrap_or_else(|| "A required value is missing.".to_string());
            ApiError::validation(operation, message)
        }
        _ => internal(schema, operation, id).with_detail(err.to_string()),
    };

    translated.with_resource(schema.path)
}

fn internal(schema: &ResourceSchema, operation: ApiOperation, id: Option<&str>) -> ApiError {
    let message = match operation {
        ApiOperation::List => format!("Error fetching {}.", schema.plural),
        ApiOperation::Create => format!("Error {} {}.", schema.create_verb, schema.noun),
        ApiOperation::Update => format!("Error updating {} '{}'.", schema.noun, id.unwrap_or_default()),
        ApiOperation::Delete => format!("Error deleting {} '{}'.", schema.noun, id.unwrap_or_default()),
        ApiOperation::Route => "An unexpected server error occurred.".to_string(),
    };
    ApiError::new(operation, ApiErrorKind::InternalError, message)
}

fn duplicate(
    schema: &ResourceSchema,
    operation: ApiOperation,
    record: Option<&Record>,
    err: &StoreError,
) -> ApiError {
    let field = resolve(
        schema,
        err,
        &[ConstraintKind::PrimaryKey, ConstraintKind::Unique],
    );
    let value = |f: &FieldSpec| record.map(|r| r.display(f.name)).unwrap_or_default();

    let message = match field {
        Some(f) if f.primary_key => {
            format!("{} with ID '{}' already exists.", schema.label, value(f))
        }
        Some(f) => match f.duplicate_template(operation == ApiOperation::Update) {
            Some(template) => template.replace("{value}", &value(f)),
            None if operation == ApiOperation::Update => format!(
                "Another {} with {} '{}' already exists.",
                schema.label,
                f.label,
                value(f)
            ),
            None => format!(
                "{} with {} '{}' already exists.",
                schema.label,
                f.label,
                value(f)
            ),
        },
        None => "Duplicate entry error.".to_string(),
    };

    ApiError::new(operation, ApiErrorKind::DuplicateKey, message)
}

fn invalid_reference(
    schema: &ResourceSchema,
    operation: ApiOperation,
    record: Option<&Record>,
    err: &StoreError,
) -> ApiError {
    let field = resolve(schema, err, &[ConstraintKind::ForeignKey])
        .filter(|f| f.is_foreign_key())
        .or_else(|| sole_reference(schema, record?));

    let message = match (field, record) {
        (Some(f), Some(r)) => format!("Invalid {} '{}' provided.", f.label, r.display(f.name)),
        _ => {
            let labels: Vec<&str> = schema.foreign_keys().map(|f| f.label).collect();
            format!("Invalid reference provided ({}).", labels.join(" or "))
        }
    };

    ApiError::new(operation, ApiErrorKind::InvalidReference, message)
}

/// Field named by the reported constraint, else by the reported column
///
/// `kinds` restricts which constraint kinds count; empty accepts any.
fn resolve(
    schema: &ResourceSchema,
    err: &StoreError,
    kinds: &[ConstraintKind],
) -> Option<&'static FieldSpec> {
    let by_constraint = err
        .constraint
        .as_deref()
        .and_then(|c| schema.field_for_constraint(c))
        .filter(|(_, kind)| kinds.is_empty() || kinds.contains(kind))
        .map(|(field, _)| field);

    by_constraint.or_else(|| {
        err.column
            .as_deref()
            .and_then(|c| schema.field_by_column(c))
    })
}

/// The only foreign key of the record that holds a value
fn sole_reference(schema: &ResourceSchema, record: &Record) -> Option<&'static FieldSpec> {
    let mut present = schema
        .foreign_keys()
        .filter(|f| record.get(f.name).is_some_and(|v| !v.is_null()));
    match (present.next(), present.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}
