//! Error types for chorus-load

use chorus_core::{CoreError, Stage};
use chorus_db::DbError;
use thiserror::Error;

use crate::schema::ConflictPolicy;

/// Loader errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// Requested conflict policy differs from the table's documented one (L001)
    #[error("[L001] Conflict policy {requested} rejected for table '{table}': table is {documented}")]
    PolicyMismatch {
        table: String,
        documented: ConflictPolicy,
        requested: ConflictPolicy,
    },

    /// Rows of one stage applied to another stage's table (L002)
    #[error("[L002] Cannot apply {row_stage} rows to table '{table}'")]
    RowTypeMismatch { table: String, row_stage: Stage },

    /// Executor failure (L003)
    #[error("[L003] {0}")]
    Db(#[from] DbError),

    /// Source, config or DAG failure (L004)
    #[error("[L004] {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for LoadError
pub type LoadResult<T> = Result<T, LoadError>;
