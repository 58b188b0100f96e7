//! In-memory [`RecordStore`] for tests
//!
//! Enforces the constraints the bundled migration declares (primary key,
//! unique, foreign key with delete restrict, integer lower bound) from the
//! same schema declarations, and reports violations with PostgreSQL's
//! constraint names.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use super::{FieldValue, Record, RecordStore, StoreError, StoreErrorKind, StoreOperation};
use crate::schema::{self, ConstraintKind, FieldKind, FieldSpec, ResourceSchema};

type Row = Vec<FieldValue>;

/// How much a violation names about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reporting {
    /// Constraint name and column
    #[default]
    Full,
    /// Column only
    ColumnOnly,
    /// Neither
    Bare,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<&'static str, Vec<Row>>>,
    reporting: Reporting,
    failure: Mutex<Option<StoreErrorKind>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reporting(reporting: Reporting) -> Self {
        Self {
            reporting,
            ..Self::default()
        }
    }

    /// Make every later call fail with `kind`
    pub fn fail_with(&self, kind: StoreErrorKind) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(kind);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::SeqCst)
    }

    pub fn row_count(&self, schema: &ResourceSchema) -> usize {
        self.tables
            .lock()
            .map(|t| t.get(schema.table).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn precheck(&self, operation: StoreOperation) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::new(
                operation,
                StoreErrorKind::ConnectionFailed,
                "connection pool is closed",
            ));
        }
        let injected = self.failure.lock().ok().and_then(|f| *f);
        match injected {
            Some(kind) => Err(StoreError::new(operation, kind, "injected failure")),
            None => Ok(()),
        }
    }

    fn violation(
        &self,
        operation: StoreOperation,
        kind: StoreErrorKind,
        schema: &ResourceSchema,
        field: &FieldSpec,
        constraint: ConstraintKind,
    ) -> StoreError {
        let name = schema.constraint_name(field, constraint);
        let err = StoreError::new(operation, kind, format!("violates \"{name}\""));
        match self.reporting {
            Reporting::Full => err
                .with_constraint(Some(name))
                .with_column(Some(field.column)),
            Reporting::ColumnOnly => err.with_column(Some(field.column)),
            Reporting::Bare => err,
        }
    }

    fn check_write(
        &self,
        tables: &HashMap<&'static str, Vec<Row>>,
        operation: StoreOperation,
        record: &Record,
        skip_row: Option<usize>,
    ) -> Result<(), StoreError> {
        let schema = record.schema;

        for (field, value) in record.fields() {
            if let (FieldKind::Integer { min: Some(min) }, FieldValue::Integer(n)) =
                (field.kind, value)
            {
                if *n < min {
                    return Err(self.violation(
                        operation,
                        StoreErrorKind::CheckViolation,
                        schema,
                        field,
                        ConstraintKind::Check,
                    ));
                }
            }
        }

        let rows = tables.get(schema.table).map(Vec::as_slice).unwrap_or(&[]);
        for (i, (field, value)) in record.fields().enumerate() {
            if !field.unique || value.is_null() {
                continue;
            }
            let taken = rows
                .iter()
                .enumerate()
                .any(|(r, row)| Some(r) != skip_row && &row[i] == value);
            if taken {
                let constraint = if field.primary_key {
                    ConstraintKind::PrimaryKey
                } else {
                    ConstraintKind::Unique
                };
                return Err(self.violation(
                    operation,
                    StoreErrorKind::UniqueViolation,
                    schema,
                    field,
                    constraint,
                ));
            }
        }

        for (field, value) in record.fields() {
            let Some(target) = field.references else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let exists = schema::by_table(target.table)
                .and_then(|parent| parent.field_by_column(target.column).map(|f| (parent, f)))
                .and_then(|(parent, f)| parent.position(f.name))
                .is_some_and(|pos| {
                    tables
                        .get(target.table)
                        .is_some_and(|rows| rows.iter().any(|row| &row[pos] == value))
                });
            if !exists {
                return Err(self.violation(
                    operation,
                    StoreErrorKind::ForeignKeyViolation,
                    schema,
                    field,
                    ConstraintKind::ForeignKey,
                ));
            }
        }

        Ok(())
    }

    /// First referencing (table, field) that still points at `row` of `schema`
    fn referencing(
        tables: &HashMap<&'static str, Vec<Row>>,
        schema: &ResourceSchema,
        row: &Row,
    ) -> Option<(&'static ResourceSchema, &'static FieldSpec)> {
        for child in schema::ALL {
            for (i, field) in child.fields.iter().enumerate() {
                let Some(target) = field.references else {
                    continue;
                };
                if target.table != schema.table {
                    continue;
                }
                let Some(pos) = schema
                    .field_by_column(target.column)
                    .and_then(|f| schema.position(f.name))
                else {
                    continue;
                };
                let key = &row[pos];
                let blocked = tables.get(child.table).is_some_and(|rows| {
                    rows.iter().any(|r| !r[i].is_null() && &r[i] == key)
                });
                if blocked {
                    return Some((child, field));
                }
            }
        }
        None
    }

    /// `ON UPDATE CASCADE`: children follow a changed referenced column
    fn cascade_update(
        tables: &mut HashMap<&'static str, Vec<Row>>,
        schema: &ResourceSchema,
        old: &Row,
        new: &Row,
    ) {
        for child in schema::ALL {
            for (i, field) in child.fields.iter().enumerate() {
                let Some(target) = field.references else {
                    continue;
                };
                if target.table != schema.table {
                    continue;
                }
                let Some(pos) = schema
                    .field_by_column(target.column)
                    .and_then(|f| schema.position(f.name))
                else {
                    continue;
                };
                if old[pos].is_null() || old[pos] == new[pos] {
                    continue;
                }
                if let Some(rows) = tables.get_mut(child.table) {
                    for row in rows.iter_mut().filter(|r| r[i] == old[pos]) {
                        row[i] = new[pos].clone();
                    }
                }
            }
        }
    }

    fn render(
        tables: &HashMap<&'static str, Vec<Row>>,
        schema: &ResourceSchema,
        row: &Row,
    ) -> Value {
        let mut object = Map::new();
        for (field, value) in schema.fields.iter().zip(row) {
            object.insert(field.name.to_string(), value.to_json());
        }
        for join in schema.joins {
            let shown = schema
                .field_by_column(join.via)
                .and_then(|f| schema.position(f.name))
                .map(|pos| &row[pos])
                .filter(|v| !v.is_null())
                .and_then(|key| {
                    let parent = schema::by_table(join.table)?;
                    let target = parent.position(parent.field_by_column(join.target)?.name)?;
                    let display = parent.position(parent.field_by_column(join.display)?.name)?;
                    tables
                        .get(join.table)?
                        .iter()
                        .find(|r| &r[target] == key)
                        .map(|r| r[display].to_json())
                })
                .unwrap_or(Value::Null);
            object.insert(join.alias.to_string(), shown);
        }
        Value::Object(object)
    }
}

fn compare(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
        (FieldValue::Integer(x), FieldValue::Integer(y)) => x.cmp(y),
        (FieldValue::Date(x), FieldValue::Date(y)) => x.cmp(y),
        (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
        (FieldValue::Null, _) => Ordering::Greater,
        (_, FieldValue::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, schema: &'static ResourceSchema) -> Result<Vec<Value>, StoreError> {
        self.precheck(StoreOperation::List)?;
        let tables = self
            .tables
            .lock()
            .map_err(|e| StoreError::new(StoreOperation::List, StoreErrorKind::Other, e.to_string()))?;

        let mut rows: Vec<&Row> = tables.get(schema.table).map(|r| r.iter().collect()).unwrap_or_default();
        let terms: Vec<(usize, bool)> = schema
            .order
            .iter()
            .filter_map(|o| {
                let field = schema.field_by_column(o.column)?;
                Some((schema.position(field.name)?, o.descending))
            })
            .collect();
        rows.sort_by(|a, b| {
            terms
                .iter()
                .map(|&(pos, desc)| {
                    let ord = compare(&a[pos], &b[pos]);
                    if desc {
                        ord.reverse()
                    } else {
                        ord
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        Ok(rows
            .into_iter()
            .map(|row| Self::render(&tables, schema, row))
            .collect())
    }

    async fn insert(&self, record: &Record) -> Result<(), StoreError> {
        self.precheck(StoreOperation::Insert)?;
        let mut tables = self.tables.lock().map_err(|e| {
            StoreError::new(StoreOperation::Insert, StoreErrorKind::Other, e.to_string())
        })?;
        self.check_write(&tables, StoreOperation::Insert, record, None)?;
        tables
            .entry(record.schema.table)
            .or_default()
            .push(record.values.clone());
        Ok(())
    }

    async fn replace(&self, record: &Record) -> Result<u64, StoreError> {
        self.precheck(StoreOperation::Replace)?;
        let mut tables = self.tables.lock().map_err(|e| {
            StoreError::new(StoreOperation::Replace, StoreErrorKind::Other, e.to_string())
        })?;
        let schema = record.schema;
        let key = record
            .get(schema.primary_key().name)
            .cloned()
            .unwrap_or(FieldValue::Null);
        let pk = schema.position(schema.primary_key().name).unwrap_or(0);

        let Some(index) = tables
            .get(schema.table)
            .and_then(|rows| rows.iter().position(|row| row[pk] == key))
        else {
            return Ok(0);
        };

        self.check_write(&tables, StoreOperation::Replace, record, Some(index))?;
        let Some(old) = tables
            .get_mut(schema.table)
            .map(|rows| std::mem::replace(&mut rows[index], record.values.clone()))
        else {
            return Ok(0);
        };
        Self::cascade_update(&mut tables, schema, &old, &record.values);
        Ok(1)
    }

    async fn delete(&self, schema: &'static ResourceSchema, id: &str) -> Result<u64, StoreError> {
        self.precheck(StoreOperation::Delete)?;
        let mut tables = self.tables.lock().map_err(|e| {
            StoreError::new(StoreOperation::Delete, StoreErrorKind::Other, e.to_string())
        })?;
        let pk = schema.position(schema.primary_key().name).unwrap_or(0);
        let key = FieldValue::Text(id.to_string());

        let Some(index) = tables
            .get(schema.table)
            .and_then(|rows| rows.iter().position(|row| row[pk] == key))
        else {
            return Ok(0);
        };

        let row = &tables[schema.table][index];
        if let Some((child, field)) = Self::referencing(&tables, schema, row) {
            return Err(self.violation(
                StoreOperation::Delete,
                StoreErrorKind::ForeignKeyViolation,
                child,
                field,
                ConstraintKind::ForeignKey,
            ));
        }

        if let Some(rows) = tables.get_mut(schema.table) {
            rows.remove(index);
        }
        Ok(1)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.precheck(StoreOperation::Ping)
    }

    async fn close(&self) {
        self.closed.store(true, AtomicOrdering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        BLOOD_TYPES, DONORS, DONOR_TRANSACTIONS, HOSPITALS, RECIPIENTS, RECIPIENT_TRANSACTIONS,
    };
    use chrono::NaiveDate;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn blood_type(id: &str, name: &str) -> Record {
        Record {
            schema: &BLOOD_TYPES,
            values: vec![text(id), text(name)],
        }
    }

    fn donor(id: &str, blood: &str, card: Option<&str>, age: i64) -> Record {
        Record {
            schema: &DONORS,
            values: vec![
                text(id),
                text("Ada"),
                text("555"),
                text(blood),
                card.map_or(FieldValue::Null, text),
                FieldValue::Integer(age),
            ],
        }
    }

    #[tokio::test]
    async fn test_primary_key_and_unique_violations() {
        let store = MemoryStore::new();
        store.insert(&blood_type("A+", "A Positive")).await.unwrap();

        let err = store.insert(&blood_type("A+", "Other")).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::UniqueViolation);
        assert_eq!(err.constraint.as_deref(), Some("blood_type_pkey"));

        let err = store.insert(&blood_type("B+", "A Positive")).await.unwrap_err();
        assert_eq!(err.constraint.as_deref(), Some("blood_type_name_key"));
        assert_eq!(store.row_count(&BLOOD_TYPES), 1);
    }

    #[tokio::test]
    async fn test_null_unique_values_do_not_collide() {
        let store = MemoryStore::new();
        store.insert(&blood_type("A+", "A Positive")).await.unwrap();
        store.insert(&donor("D1", "A+", None, 30)).await.unwrap();
        store.insert(&donor("D2", "A+", None, 30)).await.unwrap();
        store.insert(&donor("D3", "A+", Some("C1"), 30)).await.unwrap();

        let err = store.insert(&donor("D4", "A+", Some("C1"), 30)).await.unwrap_err();
        assert_eq!(err.constraint.as_deref(), Some("donor_donor_card_id_key"));
    }

    #[tokio::test]
    async fn test_foreign_key_and_check_violations() {
        let store = MemoryStore::new();
        let err = store.insert(&donor("D1", "Z+", None, 30)).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::ForeignKeyViolation);
        assert_eq!(err.constraint.as_deref(), Some("donor_blood_type_id_fkey"));

        store.insert(&blood_type("A+", "A Positive")).await.unwrap();
        let err = store.insert(&donor("D1", "A+", None, 17)).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::CheckViolation);
        assert_eq!(err.constraint.as_deref(), Some("donor_age_check"));
    }

    #[tokio::test]
    async fn test_replace_missing_row_affects_nothing() {
        let store = MemoryStore::new();
        assert_eq!(store.replace(&blood_type("O-", "O Negative")).await.unwrap(), 0);

        store.insert(&blood_type("O-", "O Negative")).await.unwrap();
        // keeping its own unique value is not a collision
        assert_eq!(store.replace(&blood_type("O-", "O Negative")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_restricted_while_referenced() {
        let store = MemoryStore::new();
        store.insert(&blood_type("A+", "A Positive")).await.unwrap();
        store.insert(&donor("D1", "A+", None, 30)).await.unwrap();

        let err = store.delete(&BLOOD_TYPES, "A+").await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::ForeignKeyViolation);
        assert_eq!(err.operation, StoreOperation::Delete);

        assert_eq!(store.delete(&DONORS, "D1").await.unwrap(), 1);
        assert_eq!(store.delete(&BLOOD_TYPES, "A+").await.unwrap(), 1);
        assert_eq!(store.delete(&BLOOD_TYPES, "A+").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_joins_and_orders() {
        let store = MemoryStore::new();
        store.insert(&blood_type("A+", "A Positive")).await.unwrap();
        store.insert(&donor("D1", "A+", None, 30)).await.unwrap();
        store
            .insert(&Record {
                schema: &HOSPITALS,
                values: vec![text("H1"), text("General"), FieldValue::Null, text("111")],
            })
            .await
            .unwrap();

        for (id, day) in [("T1", 1), ("T3", 5), ("T2", 5)] {
            store
                .insert(&Record {
                    schema: &DONOR_TRANSACTIONS,
                    values: vec![
                        text(id),
                        text("D1"),
                        FieldValue::Null,
                        FieldValue::Null,
                        FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, day).unwrap()),
                        text("H1"),
                    ],
                })
                .await
                .unwrap();
        }

        let rows = store.list(&DONOR_TRANSACTIONS).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["Donor_Trans_ID"].clone()).collect();
        assert_eq!(ids, vec!["T2", "T3", "T1"]);
        assert_eq!(rows[0]["Donor_Name"], "Ada");
        assert_eq!(rows[0]["Hospital_Name"], "General");
        assert_eq!(rows[0]["Date"], "2024-01-05");

        let donors = store.list(&DONORS).await.unwrap();
        assert_eq!(donors[0]["Blood_Type_Name"], "A Positive");
        assert_eq!(donors[0]["Donor_Card_ID"], Value::Null);
    }

    #[tokio::test]
    async fn test_changed_card_cascades_to_recipient_transactions() {
        let store = MemoryStore::new();
        store.insert(&blood_type("A+", "A Positive")).await.unwrap();
        store.insert(&donor("D1", "A+", Some("C1"), 30)).await.unwrap();
        store
            .insert(&Record {
                schema: &HOSPITALS,
                values: vec![text("H1"), text("General"), FieldValue::Null, text("111")],
            })
            .await
            .unwrap();
        store
            .insert(&Record {
                schema: &RECIPIENTS,
                values: vec![text("R1"), text("Cy"), text("222"), text("A+"), FieldValue::Null],
            })
            .await
            .unwrap();
        store
            .insert(&Record {
                schema: &RECIPIENT_TRANSACTIONS,
                values: vec![
                    text("RT1"),
                    text("R1"),
                    FieldValue::Null,
                    FieldValue::Date(NaiveDate::from_ymd_opt(2024, 2, 2).unwrap()),
                    text("C1"),
                    text("A+"),
                    text("H1"),
                ],
            })
            .await
            .unwrap();

        assert_eq!(store.replace(&donor("D1", "A+", Some("C2"), 30)).await.unwrap(), 1);

        let rows = store.list(&RECIPIENT_TRANSACTIONS).await.unwrap();
        assert_eq!(rows[0]["Donor_Card_ID"], "C2");
        assert_eq!(rows[0]["Card_Donor_ID"], "D1");

        let err = store.delete(&DONORS, "D1").await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::ForeignKeyViolation);
    }

    #[tokio::test]
    async fn test_reporting_levels() {
        let store = MemoryStore::with_reporting(Reporting::Bare);
        let err = store.insert(&donor("D1", "Z+", None, 30)).await.unwrap_err();
        assert!(err.constraint.is_none() && err.column.is_none());

        let store = MemoryStore::with_reporting(Reporting::ColumnOnly);
        let err = store.insert(&donor("D1", "Z+", None, 30)).await.unwrap_err();
        assert!(err.constraint.is_none());
        assert_eq!(err.column.as_deref(), Some("blood_type_id"));
    }

    #[tokio::test]
    async fn test_closed_store_refuses_calls() {
        let store = MemoryStore::new();
        store.close().await;
        assert!(store.is_closed());
        let err = store.ping().await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::ConnectionFailed);
    }
}
