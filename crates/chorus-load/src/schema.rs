//! Star-schema table definitions and DDL
//!
//! Each target table has a key column, column definitions and one
//! documented conflict policy. Table and sequence names are qualified with
//! the configured schema when there is one.

use chorus_core::sql_utils::{escape_sql_string, quote_ident, quote_qualified};
use chorus_core::Stage;
use chorus_db::Database;

use crate::error::LoadResult;

/// How rows are written when their key already exists in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictPolicy {
    /// Plain insert; every row is new
    AppendOnly,
    /// Keep the stored row, drop the incoming one
    UpsertKeepFirst,
    /// Replace the stored non-key columns with the incoming values
    UpsertOverwrite,
}

impl ConflictPolicy {
    /// Policy name as used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::AppendOnly => "append-only",
            ConflictPolicy::UpsertKeepFirst => "upsert-keep-first",
            ConflictPolicy::UpsertOverwrite => "upsert-overwrite",
        }
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of a star table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub not_null: bool,
    /// Store-side default; columns with a default are never inserted explicitly
    pub default: Option<String>,
}

impl ColumnDef {
    fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            not_null: false,
            default: None,
        }
    }

    fn required(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            not_null: true,
            ..Self::new(name, sql_type)
        }
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(self.name), self.sql_type);
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

/// One target table of the star schema
#[derive(Debug, Clone)]
pub struct StarTable {
    /// Stage that loads this table
    pub stage: Stage,
    /// Possibly schema-qualified table name
    pub name: String,
    /// Primary key column
    pub key: &'static str,
    pub columns: Vec<ColumnDef>,
    /// Documented conflict policy
    pub policy: ConflictPolicy,
    /// Recency column for an overwrite upsert: the stored row is replaced
    /// only when the incoming value is not older
    pub recency: Option<&'static str>,
}

impl StarTable {
    /// Columns written by INSERT statements, in row value order
    pub fn insert_columns(&self) -> Vec<&ColumnDef> {
        self.columns.iter().filter(|c| c.default.is_none()).collect()
    }

    /// Columns replaced on an overwrite upsert
    pub fn update_columns(&self) -> Vec<&ColumnDef> {
        self.insert_columns()
            .into_iter()
            .filter(|c| c.name != self.key)
            .collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table
    pub fn create_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.to_sql()))
            .collect();
        lines.push(format!("    PRIMARY KEY ({})", quote_ident(self.key)));
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            quote_qualified(&self.name),
            lines.join(",\n")
        )
    }
}

const SONGPLAY_SEQUENCE: &str = "songplay_id_seq";

/// The star tables, qualified with an optional schema
#[derive(Debug, Clone)]
pub struct StarTables {
    schema: Option<String>,
    /// Indexed by stage discriminant
    tables: [StarTable; 6],
}

impl StarTables {
    /// Build the table set for an optional schema
    pub fn new(schema: Option<&str>) -> Self {
        let schema = schema.filter(|s| !s.is_empty()).map(String::from);
        let qualify = |name: &str| match &schema {
            Some(s) => format!("{s}.{name}"),
            None => name.to_string(),
        };
        let sequence = qualify(SONGPLAY_SEQUENCE);

        let tables = [
            StarTable {
                stage: Stage::Songs,
                name: qualify("songs"),
                key: "song_id",
                columns: vec![
                    ColumnDef::required("song_id", "VARCHAR"),
                    ColumnDef::new("title", "VARCHAR"),
                    ColumnDef::required("artist_id", "VARCHAR"),
                    ColumnDef::new("year", "BIGINT"),
                    ColumnDef::new("duration", "DOUBLE"),
                ],
                policy: ConflictPolicy::UpsertKeepFirst,
                recency: None,
            },
            StarTable {
                stage: Stage::Artists,
                name: qualify("artists"),
                key: "artist_id",
                columns: vec![
                    ColumnDef::required("artist_id", "VARCHAR"),
                    ColumnDef::new("name", "VARCHAR"),
                    ColumnDef::new("location", "VARCHAR"),
                    ColumnDef::new("latitude", "DOUBLE"),
                    ColumnDef::new("longitude", "DOUBLE"),
                ],
                policy: ConflictPolicy::UpsertKeepFirst,
                recency: None,
            },
            StarTable {
                stage: Stage::Time,
                name: qualify("time"),
                key: "start_time",
                columns: vec![
                    ColumnDef::required("start_time", "TIMESTAMP"),
                    ColumnDef::new("hour", "INTEGER"),
                    ColumnDef::new("day", "INTEGER"),
                    ColumnDef::new("week", "INTEGER"),
                    ColumnDef::new("month", "INTEGER"),
                    ColumnDef::new("year", "INTEGER"),
                    ColumnDef::new("weekday", "INTEGER"),
                ],
                policy: ConflictPolicy::UpsertKeepFirst,
                recency: None,
            },
            StarTable {
                stage: Stage::Dates,
                name: qualify("dates"),
                key: "date_key",
                columns: vec![
                    ColumnDef::required("date_key", "INTEGER"),
                    ColumnDef::required("date", "DATE"),
                    ColumnDef::required("year", "INTEGER"),
                    ColumnDef::required("quarter", "INTEGER"),
                    ColumnDef::required("month", "INTEGER"),
                    ColumnDef::required("week_of_year", "INTEGER"),
                    ColumnDef::required("day_of_year", "INTEGER"),
                    ColumnDef::required("day_of_month", "INTEGER"),
                    ColumnDef::required("day_of_week", "INTEGER"),
                    ColumnDef::required("is_weekend", "BOOLEAN"),
                ],
                policy: ConflictPolicy::UpsertKeepFirst,
                recency: None,
            },
            StarTable {
                stage: Stage::Users,
                name: qualify("users"),
                key: "user_id",
                columns: vec![
                    ColumnDef::required("user_id", "BIGINT"),
                    ColumnDef::new("first_name", "VARCHAR"),
                    ColumnDef::new("last_name", "VARCHAR"),
                    ColumnDef::new("gender", "VARCHAR"),
                    ColumnDef::new("level", "VARCHAR"),
                    ColumnDef::required("last_seen", "TIMESTAMP"),
                ],
                policy: ConflictPolicy::UpsertOverwrite,
                recency: Some("last_seen"),
            },
            StarTable {
                stage: Stage::Songplays,
                name: qualify("songplays"),
                key: "songplay_id",
                columns: vec![
                    ColumnDef {
                        default: Some(format!("nextval('{}')", escape_sql_string(&sequence))),
                        ..ColumnDef::required("songplay_id", "BIGINT")
                    },
                    ColumnDef::required("start_time", "TIMESTAMP"),
                    ColumnDef::new("user_id", "BIGINT"),
                    ColumnDef::new("level", "VARCHAR"),
                    ColumnDef::new("song_id", "VARCHAR"),
                    ColumnDef::new("artist_id", "VARCHAR"),
                    ColumnDef::new("session_id", "BIGINT"),
                    ColumnDef::new("location", "VARCHAR"),
                    ColumnDef::new("user_agent", "VARCHAR"),
                    ColumnDef::new("item_in_session", "BIGINT"),
                    ColumnDef::new("length", "DOUBLE"),
                    ColumnDef::new("date_key", "INTEGER"),
                ],
                policy: ConflictPolicy::AppendOnly,
                recency: None,
            },
        ];

        Self { schema, tables }
    }

    /// Configured schema, if any
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Table loaded by a stage
    pub fn get(&self, stage: Stage) -> &StarTable {
        &self.tables[stage as usize]
    }

    /// All tables, dimensions first
    pub fn iter(&self) -> std::slice::Iter<'_, StarTable> {
        self.tables.iter()
    }

    /// Qualified name of the songplay id sequence
    pub fn sequence_name(&self) -> String {
        match &self.schema {
            Some(s) => format!("{s}.{SONGPLAY_SEQUENCE}"),
            None => SONGPLAY_SEQUENCE.to_string(),
        }
    }
}

impl Default for StarTables {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Create the schema, the songplay sequence and every star table
pub async fn create_schema(db: &dyn Database, tables: &StarTables) -> LoadResult<()> {
    if let Some(schema) = tables.schema() {
        db.create_schema_if_not_exists(schema).await?;
    }

    db.execute(&format!(
        "CREATE SEQUENCE IF NOT EXISTS {} START 1",
        quote_qualified(&tables.sequence_name())
    ))
    .await?;

    for table in tables.iter() {
        log::info!("Creating table {} ({})", table.name, table.policy);
        db.execute(&table.create_sql()).await?;
    }

    Ok(())
}

/// Drop every star table and the songplay sequence
pub async fn drop_schema(db: &dyn Database, tables: &StarTables) -> LoadResult<()> {
    // Facts first; the sequence goes last since songplays depends on it
    for table in tables.iter().rev() {
        log::info!("Dropping table {}", table.name);
        db.drop_if_exists(&table.name).await?;
    }

    db.execute(&format!(
        "DROP SEQUENCE IF EXISTS {}",
        quote_qualified(&tables.sequence_name())
    ))
    .await?;

    Ok(())
}

/// Delete every fact row. This is the explicit full-reload step.
pub async fn truncate_facts(db: &dyn Database, tables: &StarTables) -> LoadResult<usize> {
    let facts = tables.get(Stage::Songplays);
    let deleted = db
        .execute(&format!("DELETE FROM {}", quote_qualified(&facts.name)))
        .await?;
    log::info!("Full reload: deleted {} row(s) from {}", deleted, facts.name);
    Ok(deleted)
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
