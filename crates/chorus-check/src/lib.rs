//! chorus-check - Data-quality checks for Chorus
//!
//! This crate provides check SQL generation and execution
//! for loaded star tables (not_empty, unique, not_null).

pub mod generator;
pub mod runner;

pub use generator::{
    default_checks, generate_not_empty_check, generate_not_null_check, generate_unique_check,
    Check, CheckGenError, CheckKind, GeneratedCheck,
};
pub use runner::{CheckResult, CheckRunner, CheckSummary};
