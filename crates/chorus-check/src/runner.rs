//! Check execution

use crate::generator::{Check, CheckKind, GeneratedCheck};
use chorus_db::Database;
use std::time::{Duration, Instant};

/// Result of a single check execution
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Check name
    pub name: String,

    /// Table checked
    pub table: String,

    /// Column checked, if any
    pub column: Option<String>,

    /// Check kind
    pub kind: CheckKind,

    /// Whether the check passed
    pub passed: bool,

    /// Number of offending rows (0 if passed)
    pub failure_count: usize,

    /// Sample offending rows (up to 5 rows as formatted strings)
    pub sample_failures: Vec<String>,

    /// Execution time
    pub duration: Duration,

    /// Error message if generation or execution failed
    pub error: Option<String>,
}

impl CheckResult {
    /// Create a passed check result
    pub fn pass(check: &GeneratedCheck, duration: Duration) -> Self {
        Self {
            name: check.name.clone(),
            table: check.table.clone(),
            column: check.column.clone(),
            kind: check.kind,
            passed: true,
            failure_count: 0,
            sample_failures: Vec::new(),
            duration,
            error: None,
        }
    }

    /// Create a failed check result
    pub fn fail(
        check: &GeneratedCheck,
        failure_count: usize,
        sample_failures: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            passed: false,
            failure_count,
            sample_failures,
            ..Self::pass(check, duration)
        }
    }

    /// Create an errored check result
    pub fn error(check: &Check, error: String, duration: Duration) -> Self {
        Self {
            name: check.name(),
            table: check.table.clone(),
            column: check.column.clone(),
            kind: check.kind,
            passed: false,
            failure_count: 0,
            sample_failures: Vec::new(),
            duration,
            error: Some(error),
        }
    }
}

/// Summary of a check run
#[derive(Debug, Clone)]
pub struct CheckSummary {
    /// Total checks run
    pub total: usize,

    /// Checks passed
    pub passed: usize,

    /// Checks failed
    pub failed: usize,

    /// Checks with errors
    pub errors: usize,

    /// Total execution time
    pub duration: Duration,
}

impl CheckSummary {
    /// Create a summary from check results
    pub fn from_results(results: &[CheckResult], duration: Duration) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let errors = results.iter().filter(|r| r.error.is_some()).count();
        let failed = results
            .iter()
            .filter(|r| !r.passed && r.error.is_none())
            .count();

        Self {
            total,
            passed,
            failed,
            errors,
            duration,
        }
    }

    /// Check if all checks passed
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Runner for data-quality checks
pub struct CheckRunner<'a> {
    db: &'a dyn Database,
    fail_fast: bool,
}

impl<'a> CheckRunner<'a> {
    /// Create a new check runner
    pub fn new(db: &'a dyn Database) -> Self {
        Self {
            db,
            fail_fast: false,
        }
    }

    /// Stop at the first failed or errored check
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Run a single check
    pub async fn run_check(&self, check: &Check) -> CheckResult {
        let start = Instant::now();

        let generated = match check.generate() {
            Ok(generated) => generated,
            Err(e) => return CheckResult::error(check, e.to_string(), start.elapsed()),
        };

        match self.db.query_count(&generated.sql).await {
            Ok(0) => CheckResult::pass(&generated, start.elapsed()),
            Ok(count) => {
                let duration = start.elapsed();
                // Fetch sample offending rows (up to 5)
                let sample_failures = self
                    .db
                    .query_sample_rows(&generated.sql, 5)
                    .await
                    .unwrap_or_default();
                log::warn!("Check {} failed with {} row(s)", generated.name, count);
                CheckResult::fail(&generated, count, sample_failures, duration)
            }
            Err(e) => {
                log::warn!("Check {} errored: {}", generated.name, e);
                CheckResult::error(check, e.to_string(), start.elapsed())
            }
        }
    }

    /// Run checks in order and return results with a summary
    pub async fn run_all(&self, checks: &[Check]) -> (Vec<CheckResult>, CheckSummary) {
        let start = Instant::now();
        let mut results = Vec::with_capacity(checks.len());

        for check in checks {
            let result = self.run_check(check).await;
            let stop = self.fail_fast && !result.passed;
            results.push(result);
            if stop {
                log::info!("Stopping after first failing check");
                break;
            }
        }

        let summary = CheckSummary::from_results(&results, start.elapsed());
        (results, summary)
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
