//! Record storage
//!
//! [`RecordStore`] is the seam between the HTTP handlers and the database.
//! Each method issues exactly one statement built from a [`ResourceSchema`];
//! constraint enforcement stays with the store and comes back as a
//! classified [`StoreError`].

mod error;
#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod sql;

pub use error::{StoreError, StoreErrorKind, StoreOperation};
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

use crate::schema::{FieldSpec, ResourceSchema};

/// A normalized field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    /// Absent optional value, stored as SQL NULL
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::from(*n),
            Self::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Null => Value::Null,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Null => Ok(()),
        }
    }
}

/// A validated row: one value per schema field, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub schema: &'static ResourceSchema,
    pub values: Vec<FieldValue>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema.position(name).and_then(|i| self.values.get(i))
    }

    /// Values paired with their fields
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, &FieldValue)> + '_ {
        let fields: &'static [FieldSpec] = self.schema.fields;
        fields.iter().zip(self.values.iter())
    }

    /// The primary key rendered as text
    pub fn key(&self) -> String {
        self.get(self.schema.primary_key().name)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Text for a field, empty when absent
    pub fn display(&self, name: &str) -> String {
        self.get(name).map(ToString::to_string).unwrap_or_default()
    }
}

/// Storage operations shared by every resource
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows of a resource as JSON objects, join-enriched and ordered
    async fn list(&self, schema: &'static ResourceSchema) -> Result<Vec<Value>, StoreError>;

    /// Insert a new row
    async fn insert(&self, record: &Record) -> Result<(), StoreError>;

    /// Replace every non-key column of the row keyed by the record's primary key;
    /// returns the number of rows affected
    async fn replace(&self, record: &Record) -> Result<u64, StoreError>;

    /// Delete the row with this primary key; returns the number of rows affected
    async fn delete(&self, schema: &'static ResourceSchema, id: &str) -> Result<u64, StoreError>;

    /// Confirm the store answers a trivial query
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release all connections; later calls fail
    async fn close(&self);
}
