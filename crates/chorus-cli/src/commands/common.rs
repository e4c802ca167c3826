//! Shared utilities for CLI commands

use chorus_load::LoadError;
use std::fmt;

/// Exit code for failed data-quality checks
pub(crate) const EXIT_CHECK_FAILURE: u8 = 2;

/// Exit code for database errors during a load
pub(crate) const EXIT_DATABASE_ERROR: u8 = 4;

/// Error type representing a non-zero process exit code.
///
/// Commands return `Err(ExitCode(N).into())` after printing their own
/// report; `main` maps it to the process exit status without printing.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Report a load failure. Database failures become exit code 4, anything
/// else is passed through with context.
pub(crate) fn load_failure(err: LoadError, what: &str) -> anyhow::Error {
    match err {
        LoadError::Db(db_err) => {
            println!("  ✗ {what} - {db_err}");
            ExitCode(EXIT_DATABASE_ERROR).into()
        }
        other => anyhow::Error::new(other).context(format!("{what} failed")),
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
