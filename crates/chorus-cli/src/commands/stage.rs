//! Stage command implementation

use anyhow::Result;
use chorus_load::stage_sources;

use crate::cli::GlobalArgs;
use crate::commands::common::load_failure;
use crate::context::RuntimeContext;

/// Execute the stage command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;

    println!("Staging raw sources...\n");
    let staged = stage_sources(
        ctx.db.as_ref(),
        &ctx.config,
        &ctx.project_root,
        ctx.tables.schema(),
    )
    .await
    .map_err(|e| load_failure(e, "Stage"))?;

    if staged.is_empty() {
        println!("No source files found.");
        return Ok(());
    }

    let mut total_rows = 0;
    for table in &staged {
        total_rows += table.rows;
        println!(
            "  ✓ {} ({} rows from {} files)",
            table.table, table.rows, table.files
        );
    }

    println!();
    println!("Staged {} tables ({} total rows)", staged.len(), total_rows);
    Ok(())
}
