//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use chorus_core::SourceFormat;

/// Statement executor used by the loader and the data-quality checks
///
/// Implementations must be Send + Sync for async operation. Calls are
/// awaited one at a time; retries and timeouts are the implementation's
/// business, not the caller's.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a single statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple `;`-separated statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Count the rows a query returns
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// First column of the first row as text, or `None` when no rows or NULL
    async fn query_one(&self, sql: &str) -> DbResult<Option<String>>;

    /// Up to `limit` rows of a query, each formatted as a single string
    async fn query_sample_rows(&self, sql: &str, limit: usize) -> DbResult<Vec<String>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Drop a table or view if it exists
    async fn drop_if_exists(&self, name: &str) -> DbResult<()>;

    /// Create a schema if it does not exist
    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()>;

    /// Bulk-load files matching `path` (a file or glob) into `table`,
    /// replacing its contents
    async fn load_file(&self, table: &str, path: &str, format: SourceFormat) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
