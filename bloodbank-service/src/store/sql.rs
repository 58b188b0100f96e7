//! SQL generation from resource schemas
//!
//! Identifiers come only from static schema declarations; values are always
//! bound as `$n` parameters.

use crate::schema::ResourceSchema;

/// SQL text plus the record positions to bind, in placeholder order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<usize>,
}

/// `SELECT json_build_object(...) ... ORDER BY ...` producing one JSON object per row
pub fn list(schema: &ResourceSchema) -> String {
    let mut pairs: Vec<String> = schema
        .fields
        .iter()
        .map(|f| format!("'{}', t.{}", f.name, f.column))
        .collect();
    pairs.extend(
        schema
            .joins
            .iter()
            .enumerate()
            .map(|(i, j)| format!("'{}', j{i}.{}", j.alias, j.display)),
    );

    let mut sql = format!(
        "SELECT json_build_object({}) AS row FROM {} t",
        pairs.join(", "),
        schema.table
    );
    for (i, j) in schema.joins.iter().enumerate() {
        sql.push_str(&format!(
            " LEFT JOIN {table} j{i} ON j{i}.{target} = t.{via}",
            table = j.table,
            target = j.target,
            via = j.via,
        ));
    }

    let order: Vec<String> = schema
        .order
        .iter()
        .map(|o| {
            format!(
                "t.{} {}",
                o.column,
                if o.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    sql.push_str(" ORDER BY ");
    sql.push_str(&order.join(", "));
    sql
}

pub fn insert(schema: &ResourceSchema) -> Statement {
    let columns: Vec<&str> = schema.fields.iter().map(|f| f.column).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.table,
            columns.join(", "),
            placeholders.join(", ")
        ),
        binds: (0..columns.len()).collect(),
    }
}

/// Full-row replace keyed by primary key; the key itself is never rewritten
pub fn replace(schema: &ResourceSchema) -> Statement {
    let mut binds = Vec::with_capacity(schema.fields.len());
    let mut sets = Vec::with_capacity(schema.fields.len());
    let mut key = 0;

    for (i, field) in schema.fields.iter().enumerate() {
        if field.primary_key {
            key = i;
            continue;
        }
        binds.push(i);
        sets.push(format!("{} = ${}", field.column, binds.len()));
    }
    binds.push(key);

    Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            schema.table,
            sets.join(", "),
            schema.primary_key().column,
            binds.len()
        ),
        binds,
    }
}

pub fn delete(schema: &ResourceSchema) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        schema.table,
        schema.primary_key().column
    )
}
