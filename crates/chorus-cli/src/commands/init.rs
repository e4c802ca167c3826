//! Init command implementation

use anyhow::Result;
use chorus_load::create_schema;

use crate::cli::GlobalArgs;
use crate::commands::common::load_failure;
use crate::context::RuntimeContext;

/// Execute the init command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;

    create_schema(ctx.db.as_ref(), &ctx.tables)
        .await
        .map_err(|e| load_failure(e, "Create schema"))?;

    println!(
        "Created star schema for '{}' ({} target)",
        ctx.config.name,
        ctx.target.as_deref().unwrap_or("default")
    );
    for table in ctx.tables.iter() {
        println!("  ✓ {} ({})", table.name, table.policy);
    }
    Ok(())
}
