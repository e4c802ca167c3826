//! Reset command implementation

use anyhow::Result;
use chorus_load::{create_schema, drop_schema};

use crate::cli::GlobalArgs;
use crate::commands::common::load_failure;
use crate::context::RuntimeContext;

/// Execute the reset command: drop every star table, then recreate them
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;

    drop_schema(ctx.db.as_ref(), &ctx.tables)
        .await
        .map_err(|e| load_failure(e, "Drop schema"))?;
    create_schema(ctx.db.as_ref(), &ctx.tables)
        .await
        .map_err(|e| load_failure(e, "Create schema"))?;

    println!("Reset {} tables:", ctx.tables.iter().count());
    for table in ctx.tables.iter() {
        println!("  ✓ {}", table.name);
    }
    Ok(())
}
