//! chorus-load - Star-schema loader for Chorus
//!
//! This crate owns the target table definitions and their conflict
//! policies, renders and applies row inserts through the `Database`
//! executor, and drives the staged pipeline that loads dimensions before
//! the facts that reference them.

pub mod apply;
pub mod error;
pub mod pipeline;
pub mod rows;
pub mod schema;
pub mod stage;

pub use apply::{apply_to_store, render_insert};
pub use error::{LoadError, LoadResult};
pub use pipeline::{BatchReport, BatchSource, Pipeline, PipelineOptions, RunSummary};
pub use rows::TableRow;
pub use schema::{
    create_schema, drop_schema, truncate_facts, ColumnDef, ConflictPolicy, StarTable, StarTables,
};
pub use stage::{stage_sources, StagedTable};
