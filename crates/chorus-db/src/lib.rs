//! chorus-db - Statement executor for Chorus
//!
//! This crate provides the `Database` trait the loader talks to, and its
//! DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::Database;
