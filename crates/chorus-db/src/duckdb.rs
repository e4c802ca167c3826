//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use chorus_core::sql_utils::{escape_sql_string, quote_ident, quote_qualified, split_qualified_name};
use chorus_core::SourceFormat;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        log::debug!("duckdb execute: {}", truncate_for_log(sql));
        conn.execute(sql, []).map_err(|e| {
            log::debug!("duckdb statement failed: {e}");
            DbError::from(e)
        })
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        log::debug!("duckdb execute_batch: {}", truncate_for_log(sql));
        conn.execute_batch(sql).map_err(DbError::from)
    }

    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
            row.get(0)
        })?;
        Ok(count.max(0) as usize)
    }

    fn query_one_sync(&self, sql: &str) -> DbResult<Option<String>> {
        let conn = self.lock()?;
        let wrapped = format!("SELECT CAST(q.v AS VARCHAR) FROM ({}) AS q(v) LIMIT 1", sql);
        match conn.query_row(&wrapped, [], |row| row.get::<_, Option<String>>(0)) {
            Ok(value) => Ok(value),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn query_sample_rows_sync(&self, sql: &str, limit: usize) -> DbResult<Vec<String>> {
        let conn = self.lock()?;
        let wrapped = format!(
            "SELECT CAST(q AS VARCHAR) FROM ({}) AS q LIMIT {}",
            sql, limit
        );
        let mut stmt = conn.prepare(&wrapped)?;
        let rows = stmt.query_map([], |row| row.get::<_, Option<String>>(0))?;
        rows.map(|r| r.map(Option::unwrap_or_default).map_err(DbError::from))
            .collect()
    }

    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let (schema, table) = split_qualified_name(name);
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}'",
            escape_sql_string(schema),
            escape_sql_string(table)
        );
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count > 0)
    }
}

/// Keep debug logs readable when a statement carries thousands of rows
fn truncate_for_log(sql: &str) -> &str {
    const MAX: usize = 240;
    if sql.len() <= MAX {
        return sql;
    }
    let mut end = MAX;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn query_one(&self, sql: &str) -> DbResult<Option<String>> {
        self.query_one_sync(sql)
    }

    async fn query_sample_rows(&self, sql: &str, limit: usize) -> DbResult<Vec<String>> {
        self.query_sample_rows_sync(sql, limit)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn drop_if_exists(&self, name: &str) -> DbResult<()> {
        let quoted = quote_qualified(name);
        // DROP VIEW fails on a table and vice versa; try both
        if let Err(e) = self.execute_sync(&format!("DROP VIEW IF EXISTS {}", quoted)) {
            log::debug!("DROP VIEW {name} skipped: {e}");
        }
        self.execute_sync(&format!("DROP TABLE IF EXISTS {}", quoted))?;
        Ok(())
    }

    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()> {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
        self.execute_sync(&sql)?;
        Ok(())
    }

    async fn load_file(&self, table: &str, path: &str, format: SourceFormat) -> DbResult<()> {
        let reader = match format {
            SourceFormat::Json => "read_json_auto",
            SourceFormat::Csv => "read_csv_auto",
        };
        let sql = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}('{}')",
            quote_qualified(table),
            reader,
            escape_sql_string(path)
        );
        self.execute_sync(&sql)
            .map(|_| ())
            .map_err(|e| DbError::LoadError {
                table: table.to_string(),
                message: e.to_string(),
            })
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
