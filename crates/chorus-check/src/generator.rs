//! Check SQL generation
//!
//! Every check renders a query that returns offending rows. A check passes
//! when its query returns nothing.

use chorus_core::sql_utils::{quote_ident, quote_qualified};
use chorus_core::Stage;
use chorus_load::StarTables;
use thiserror::Error;

/// Error type for check SQL generation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CheckGenError {
    /// Table name is empty
    #[error("check has no table name")]
    MissingTable,

    /// Column check without a column
    #[error("{kind} check on '{table}' has no column")]
    MissingColumn { kind: CheckKind, table: String },
}

/// Result type alias for check generation
pub type CheckGenResult<T> = Result<T, CheckGenError>;

/// Kind of data-quality check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    NotEmpty,
    Unique,
    NotNull,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::NotEmpty => write!(f, "not_empty"),
            CheckKind::Unique => write!(f, "unique"),
            CheckKind::NotNull => write!(f, "not_null"),
        }
    }
}

/// Generate SQL for a not_empty check
///
/// Returns a single row when the table has no rows.
pub fn generate_not_empty_check(table: &str) -> String {
    format!(
        "SELECT 1 AS empty_table WHERE NOT EXISTS (SELECT 1 FROM {})",
        quote_qualified(table)
    )
}

/// Generate SQL for a unique check
///
/// Returns rows that violate the unique constraint (duplicates).
pub fn generate_unique_check(table: &str, column: &str) -> String {
    let qt = quote_qualified(table);
    let qc = quote_ident(column);
    format!("SELECT {qc}, COUNT(*) as cnt\nFROM {qt}\nGROUP BY {qc}\nHAVING COUNT(*) > 1")
}

/// Generate SQL for a not_null check
///
/// Returns rows where the column is NULL.
pub fn generate_not_null_check(table: &str, column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} IS NULL",
        quote_qualified(table),
        quote_ident(column)
    )
}

/// A data-quality check on one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub kind: CheckKind,
    pub table: String,
    pub column: Option<String>,
}

impl Check {
    pub fn not_empty(table: impl Into<String>) -> Self {
        Self {
            kind: CheckKind::NotEmpty,
            table: table.into(),
            column: None,
        }
    }

    pub fn unique(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            kind: CheckKind::Unique,
            table: table.into(),
            column: Some(column.into()),
        }
    }

    pub fn not_null(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            kind: CheckKind::NotNull,
            table: table.into(),
            column: Some(column.into()),
        }
    }

    /// Display name, e.g. `unique_users_user_id`
    pub fn name(&self) -> String {
        match &self.column {
            Some(column) => format!("{}_{}_{}", self.kind, self.table, column),
            None => format!("{}_{}", self.kind, self.table),
        }
    }

    fn column_or_err(&self) -> CheckGenResult<&str> {
        self.column
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CheckGenError::MissingColumn {
                kind: self.kind,
                table: self.table.clone(),
            })
    }

    /// Render the check's SQL
    pub fn generate(&self) -> CheckGenResult<GeneratedCheck> {
        if self.table.trim().is_empty() {
            return Err(CheckGenError::MissingTable);
        }
        let sql = match self.kind {
            CheckKind::NotEmpty => generate_not_empty_check(&self.table),
            CheckKind::Unique => generate_unique_check(&self.table, self.column_or_err()?),
            CheckKind::NotNull => generate_not_null_check(&self.table, self.column_or_err()?),
        };
        Ok(GeneratedCheck {
            name: self.name(),
            table: self.table.clone(),
            column: self.column.clone(),
            kind: self.kind,
            sql,
        })
    }
}

/// Generated check with metadata
#[derive(Debug, Clone)]
pub struct GeneratedCheck {
    /// Check name (e.g., "unique_users_user_id")
    pub name: String,

    /// Table being checked
    pub table: String,

    /// Column being checked, if any
    pub column: Option<String>,

    /// Check kind
    pub kind: CheckKind,

    /// SQL returning offending rows
    pub sql: String,
}

/// The standard checks for a loaded star schema:
/// non-empty tables, unique keys and fact timestamps present
pub fn default_checks(tables: &StarTables) -> Vec<Check> {
    let mut checks: Vec<Check> = tables.iter().map(|t| Check::not_empty(&t.name)).collect();

    checks.extend(tables.iter().map(|t| Check::unique(&t.name, t.key)));

    checks.push(Check::not_null(
        &tables.get(Stage::Songplays).name,
        "start_time",
    ));
    checks
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
