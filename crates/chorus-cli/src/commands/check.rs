//! Check command implementation

use anyhow::Result;
use chorus_check::{default_checks, CheckRunner};

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::common::{ExitCode, EXIT_CHECK_FAILURE};
use crate::context::RuntimeContext;

/// Execute the check command
pub async fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;

    let checks = default_checks(&ctx.tables);
    println!("Running {} checks...\n", checks.len());

    let (results, summary) = CheckRunner::new(ctx.db.as_ref())
        .fail_fast(args.fail_fast)
        .run_all(&checks)
        .await;

    for result in &results {
        if result.passed {
            println!("  ✓ {} [{}ms]", result.name, result.duration.as_millis());
        } else if let Some(error) = &result.error {
            println!(
                "  ✗ {} - {} [{}ms]",
                result.name,
                error,
                result.duration.as_millis()
            );
        } else {
            println!(
                "  ✗ {} ({} failures) [{}ms]",
                result.name,
                result.failure_count,
                result.duration.as_millis()
            );

            if !result.sample_failures.is_empty() {
                println!("    Sample failing rows:");
                for (i, row) in result.sample_failures.iter().enumerate() {
                    println!("      {}. {}", i + 1, row);
                }
                if result.failure_count > result.sample_failures.len() {
                    println!(
                        "      ... and {} more",
                        result.failure_count - result.sample_failures.len()
                    );
                }
            }
        }
    }

    println!();
    println!(
        "Passed: {}, Failed: {}",
        summary.passed,
        summary.failed + summary.errors
    );

    if !summary.all_passed() {
        return Err(ExitCode(EXIT_CHECK_FAILURE).into());
    }

    Ok(())
}
