//! Bulk-load of raw source files into staging tables
//!
//! Independent of the transform: the raw files land as-is in
//! `staging_events` and `staging_songs` through the executor's file reader.

use std::path::Path;

use chorus_core::sql_utils::quote_qualified;
use chorus_core::{Config, FileSource, SourceConfig};
use chorus_db::Database;

use crate::error::LoadResult;

/// Result of staging one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTable {
    /// Possibly schema-qualified staging table name
    pub table: String,
    /// Files the source resolved to
    pub files: usize,
    /// Rows in the staging table after the load
    pub rows: usize,
}

/// Bulk-load both raw sources into their staging tables, replacing any
/// previous contents. A source with no files is skipped with a warning.
pub async fn stage_sources(
    db: &dyn Database,
    config: &Config,
    project_root: &Path,
    schema: Option<&str>,
) -> LoadResult<Vec<StagedTable>> {
    if let Some(schema) = schema {
        db.create_schema_if_not_exists(schema).await?;
    }

    let mut staged = Vec::new();
    for (name, source) in [
        ("staging_events", &config.sources.log_data),
        ("staging_songs", &config.sources.song_data),
    ] {
        let table = match schema {
            Some(s) => format!("{s}.{name}"),
            None => name.to_string(),
        };
        if let Some(result) = stage_one(db, &table, source, project_root).await? {
            staged.push(result);
        }
    }

    Ok(staged)
}

async fn stage_one(
    db: &dyn Database,
    table: &str,
    source: &SourceConfig,
    project_root: &Path,
) -> LoadResult<Option<StagedTable>> {
    let file_source = FileSource::from_config(table, source, project_root);
    let files = file_source.discover_files()?;
    if files.is_empty() {
        log::warn!(
            "No {} files under {}; skipping {}",
            source.format,
            file_source.root().display(),
            table
        );
        return Ok(None);
    }

    let root = file_source.root();
    let pattern = if root.is_file() {
        root.display().to_string()
    } else {
        root.join("**")
            .join(format!("*.{}", source.format.extension()))
            .display()
            .to_string()
    };

    log::info!("Staging {} file(s) from {} into {}", files.len(), pattern, table);
    db.load_file(table, &pattern, source.format).await?;
    let rows = db
        .query_count(&format!("SELECT * FROM {}", quote_qualified(table)))
        .await?;

    Ok(Some(StagedTable {
        table: table.to_string(),
        files: files.len(),
        rows,
    }))
}

#[cfg(test)]
#[path = "stage_test.rs"]
mod tests;
