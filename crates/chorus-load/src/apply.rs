//! Rendering and applying row inserts under a conflict policy

use chorus_core::sql_utils::{quote_ident, quote_qualified};
use chorus_db::Database;

use crate::error::{LoadError, LoadResult};
use crate::rows::TableRow;
use crate::schema::{ConflictPolicy, StarTable};

/// Render one multi-row INSERT for `rows` under `policy`
///
/// Callers validate the policy; rendering does not.
pub fn render_insert<R: TableRow>(table: &StarTable, rows: &[R], policy: ConflictPolicy) -> String {
    let columns = table
        .insert_columns()
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let values = rows
        .iter()
        .map(|row| {
            let literals: Vec<String> = row.values().iter().map(|v| v.to_sql()).collect();
            format!("({})", literals.join(", "))
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES\n{}",
        quote_qualified(&table.name),
        columns,
        values
    );

    match policy {
        ConflictPolicy::AppendOnly => {}
        ConflictPolicy::UpsertKeepFirst => {
            sql.push_str(&format!(
                "\nON CONFLICT ({}) DO NOTHING",
                quote_ident(table.key)
            ));
        }
        ConflictPolicy::UpsertOverwrite => {
            let assignments = table
                .update_columns()
                .iter()
                .map(|c| {
                    let col = quote_ident(c.name);
                    format!("{col} = EXCLUDED.{col}")
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(
                "\nON CONFLICT ({}) DO UPDATE SET {}",
                quote_ident(table.key),
                assignments
            ));
            // Unqualified columns in the WHERE clause refer to the stored row
            if let Some(recency) = table.recency {
                let col = quote_ident(recency);
                sql.push_str(&format!(" WHERE EXCLUDED.{col} >= {col}"));
            }
        }
    }

    sql
}

/// Write `rows` to `table`, `chunk_size` rows per statement.
///
/// The policy must be the table's documented one; a mismatch is rejected
/// before any statement runs. Executor failures propagate unchanged and
/// chunks already written stay written. Returns the number of rows
/// submitted.
pub async fn apply_to_store<R: TableRow>(
    db: &dyn Database,
    table: &StarTable,
    rows: &[R],
    policy: ConflictPolicy,
    chunk_size: usize,
) -> LoadResult<usize> {
    if R::STAGE != table.stage {
        return Err(LoadError::RowTypeMismatch {
            table: table.name.clone(),
            row_stage: R::STAGE,
        });
    }
    if policy != table.policy {
        return Err(LoadError::PolicyMismatch {
            table: table.name.clone(),
            documented: table.policy,
            requested: policy,
        });
    }

    if rows.is_empty() {
        return Ok(0);
    }

    for chunk in rows.chunks(chunk_size.max(1)) {
        db.execute(&render_insert(table, chunk, policy)).await?;
    }

    log::debug!(
        "Applied {} row(s) to {} ({})",
        rows.len(),
        table.name,
        policy
    );
    Ok(rows.len())
}

#[cfg(test)]
#[path = "apply_test.rs"]
mod tests;
