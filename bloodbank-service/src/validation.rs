//! Payload validation and normalization
//!
//! Turns a JSON request body into a [`Record`] for one resource, or a
//! [`ValidationError`] whose message names the offending fields. Runs
//! entirely before any store call.
//!
//! Order of checks:
//! 1. the body is a JSON object;
//! 2. every required field is present and not blank after trimming
//!    (all missing fields are reported together);
//! 3. each field is parsed for its kind and domain rule.
//!
//! Optional fields that are absent, `null` or blank become [`FieldValue::Null`].

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

use crate::schema::{join_labels, FieldKind, FieldSpec, ResourceSchema};
use crate::store::{FieldValue, Record};

/// `YYYY-MM-DD`, nothing before or after
static DATE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex is valid"));

/// What the payload is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent<'a> {
    /// The body carries the primary key
    Create,
    /// The primary key comes from the path; any key in the body is ignored
    Update { id: &'a str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Fields the message is about, by wire name
    pub fields: Vec<&'static str>,
}

impl ValidationError {
    fn new(message: impl Into<String>, fields: Vec<&'static str>) -> Self {
        Self {
            message: message.into(),
            fields,
        }
    }

    fn for_field(field: &FieldSpec, message: impl Into<String>) -> Self {
        Self::new(message, vec![field.name])
    }
}

/// Validate `payload` against `schema`
pub fn validate(
    schema: &'static ResourceSchema,
    payload: &Value,
    intent: Intent<'_>,
) -> Result<Record, ValidationError> {
    let Some(body) = payload.as_object() else {
        return Err(ValidationError::new(
            "Request body must be a JSON object.",
            Vec::new(),
        ));
    };

    let from_body = |field: &FieldSpec| !(field.primary_key && matches!(intent, Intent::Update { .. }));

    let missing: Vec<&'static FieldSpec> = schema
        .fields
        .iter()
        .filter(|f| f.required && from_body(*f) && is_blank(body, f.name))
        .collect();
    if !missing.is_empty() {
        let labels: Vec<&str> = missing.iter().map(|f| f.label).collect();
        let verb = if missing.len() == 1 { "is" } else { "are" };
        return Err(ValidationError::new(
            format!("{} {verb} required.", join_labels(&labels)),
            missing.iter().map(|f| f.name).collect(),
        ));
    }

    let mut values = Vec::with_capacity(schema.fields.len());
    for field in schema.fields {
        let value = match intent {
            Intent::Update { id } if field.primary_key => FieldValue::Text(id.to_string()),
            _ => parse_field(field, body.get(field.name))?,
        };
        values.push(value);
    }

    Ok(Record { schema, values })
}

fn is_blank(body: &Map<String, Value>, name: &str) -> bool {
    match body.get(name) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn parse_field(field: &FieldSpec, raw: Option<&Value>) -> Result<FieldValue, ValidationError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(FieldValue::Null),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(FieldValue::Null),
        Some(v) => v,
    };

    match field.kind {
        FieldKind::Text => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.trim().to_string())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            _ => Err(ValidationError::for_field(
                field,
                format!("{} must be a string.", field.label),
            )),
        },
        FieldKind::Integer { min } => {
            let parsed = match raw {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            match parsed {
                Some(n) if min.map_or(true, |min| n >= min) => Ok(FieldValue::Integer(n)),
                _ => Err(rule_failure(field)),
            }
        }
        FieldKind::Date => {
            let parsed = raw
                .as_str()
                .map(str::trim)
                .filter(|s| DATE_FORMAT.is_match(s))
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            parsed.map(FieldValue::Date).ok_or_else(|| rule_failure(field))
        }
    }
}

fn rule_failure(field: &FieldSpec) -> ValidationError {
    let message = field
        .rule_message
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} is invalid.", field.label));
    ValidationError::for_field(field, message)
}
