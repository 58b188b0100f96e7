//! Declarative resource schemas
//!
//! Every resource the API exposes is described by a static [`ResourceSchema`]:
//! its table, its fields and their rules, the read-side joins used to enrich
//! list output, and the wording of its responses. Validation, SQL generation,
//! the in-memory test store and error translation all read the same
//! declaration, so the six resources differ only in data.
//!
//! Constraint names follow PostgreSQL's default convention
//! (`{table}_pkey`, `{table}_{column}_key`, `{table}_{column}_fkey`,
//! `{table}_{column}_check`) and the bundled migration creates them explicitly,
//! which lets [`ResourceSchema::field_for_constraint`] map a violation back to
//! the field that caused it.

pub mod resources;

pub use resources::{
    by_path, by_table, ALL, BLOOD_TYPES, DONORS, DONOR_TRANSACTIONS, HOSPITALS, RECIPIENTS,
    RECIPIENT_TRANSACTIONS,
};

/// Value domain of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, stored trimmed
    Text,
    /// Whole number with an optional lower bound
    Integer { min: Option<i64> },
    /// Calendar date written as `YYYY-MM-DD`
    Date,
}

/// Foreign-key target of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub table: &'static str,
    pub column: &'static str,
}

/// Kind of constraint encoded in a conventional constraint name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
}

/// One field of a resource: wire name, column and rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON key on the wire
    pub name: &'static str,
    /// Column in the backing table
    pub column: &'static str,
    /// Human-readable name used in messages
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub references: Option<Reference>,
    /// Message for a domain-rule failure (age bound, date format)
    pub rule_message: Option<&'static str>,
    /// Message for a uniqueness collision, `{value}` is substituted
    pub duplicate_message: Option<&'static str>,
    /// Same, when the collision comes from an update
    pub duplicate_update_message: Option<&'static str>,
}

impl FieldSpec {
    pub const fn text(name: &'static str, column: &'static str, label: &'static str) -> Self {
        Self {
            name,
            column,
            label,
            kind: FieldKind::Text,
            required: false,
            primary_key: false,
            unique: false,
            references: None,
            rule_message: None,
            duplicate_message: None,
            duplicate_update_message: None,
        }
    }

    pub const fn integer(
        name: &'static str,
        column: &'static str,
        label: &'static str,
        min: Option<i64>,
    ) -> Self {
        Self {
            kind: FieldKind::Integer { min },
            ..Self::text(name, column, label)
        }
    }

    pub const fn date(name: &'static str, column: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Date,
            ..Self::text(name, column, label)
        }
    }

    /// Primary keys are always required and unique
    pub const fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            required: true,
            unique: true,
            ..self
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    pub const fn references(self, table: &'static str, column: &'static str) -> Self {
        Self {
            references: Some(Reference { table, column }),
            ..self
        }
    }

    pub const fn rule(self, message: &'static str) -> Self {
        Self {
            rule_message: Some(message),
            ..self
        }
    }

    /// Collision messages for create and update
    pub const fn on_duplicate(self, create: &'static str, update: &'static str) -> Self {
        Self {
            duplicate_message: Some(create),
            duplicate_update_message: Some(update),
            ..self
        }
    }

    /// Collision message for a create or an update, when one is declared
    pub const fn duplicate_template(&self, on_update: bool) -> Option<&'static str> {
        match (on_update, self.duplicate_update_message) {
            (true, Some(message)) => Some(message),
            _ => self.duplicate_message,
        }
    }

    pub const fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }
}

/// Read-side join adding a display column of a referenced row to list output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    /// JSON key of the added value
    pub alias: &'static str,
    /// Local column holding the reference
    pub via: &'static str,
    pub table: &'static str,
    /// Column of `table` matched against `via`
    pub target: &'static str,
    /// Column of `table` copied into the output
    pub display: &'static str,
}

/// One list ordering term over a base-table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// How a successful create is announced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedMessage {
    /// `{label} '{value of field}' created successfully.`
    Titled(&'static str),
    /// Fixed text
    Fixed(&'static str),
}

/// Complete description of one resource
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceSchema {
    /// Path segment under `/api`
    pub path: &'static str,
    /// Display name, e.g. "Blood Type"
    pub label: &'static str,
    /// Lowercase noun used in failure messages, e.g. "blood type"
    pub noun: &'static str,
    /// Lowercase plural used for list failures
    pub plural: &'static str,
    /// Verb used for create failures ("creating", "recording")
    pub create_verb: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub created: CreatedMessage,
    /// Who blocks a delete, as in "It is referenced by {dependents}."
    pub dependents: &'static str,
    pub joins: &'static [Join],
    pub order: &'static [OrderBy],
}

impl ResourceSchema {
    /// The primary-key field
    ///
    /// Every declared resource has exactly one; this is checked by the registry tests.
    pub fn primary_key(&self) -> &'static FieldSpec {
        let fields: &'static [FieldSpec] = self.fields;
        fields
            .iter()
            .find(|f| f.primary_key)
            .unwrap_or(&fields[0])
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_column(&self, column: &str) -> Option<&'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|f| f.column == column)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().filter(|f| f.is_foreign_key())
    }

    /// Conventional name of a constraint on `field`
    pub fn constraint_name(&self, field: &FieldSpec, kind: ConstraintKind) -> String {
        match kind {
            ConstraintKind::PrimaryKey => format!("{}_pkey", self.table),
            ConstraintKind::Unique => format!("{}_{}_key", self.table, field.column),
            ConstraintKind::ForeignKey => format!("{}_{}_fkey", self.table, field.column),
            ConstraintKind::Check => format!("{}_{}_check", self.table, field.column),
        }
    }

    /// Resolve a constraint name of this table to the field it guards
    pub fn field_for_constraint(
        &self,
        constraint: &str,
    ) -> Option<(&'static FieldSpec, ConstraintKind)> {
        let rest = constraint.strip_prefix(self.table)?.strip_prefix('_')?;
        if rest == "pkey" {
            return Some((self.primary_key(), ConstraintKind::PrimaryKey));
        }

        let (column, kind) = if let Some(column) = rest.strip_suffix("_fkey") {
            (column, ConstraintKind::ForeignKey)
        } else if let Some(column) = rest.strip_suffix("_key") {
            (column, ConstraintKind::Unique)
        } else if let Some(column) = rest.strip_suffix("_check") {
            (column, ConstraintKind::Check)
        } else {
            return None;
        };

        self.field_by_column(column).map(|field| (field, kind))
    }
}

/// Join labels as prose: `A`, `A and B`, `A, B, and C`
pub fn join_labels(labels: &[&str]) -> String {
    match labels {
        [] => String::new(),
        [one] => (*one).to_string(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}
