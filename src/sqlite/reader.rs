// ABOUTME: Reads source rows in the column order declared by the migration plan
// ABOUTME: Positional values keep the reader aligned with the destination insert

use crate::plan::TablePlan;
use crate::utils::quote_ident;
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::Connection;

/// Read every row of a planned table.
///
/// Columns are selected explicitly in the plan's declared order, so each
/// returned row is a positional vector that lines up one-to-one with the
/// destination insert's parameter list. A missing table or column surfaces
/// here as a fatal source-read error.
pub fn read_rows(conn: &Connection, plan: &TablePlan) -> Result<Vec<Vec<Value>>> {
    for column in plan.columns {
        crate::utils::validate_sql_identifier(column.name)
            .with_context(|| format!("Invalid column name in plan for '{}'", plan.table))?;
    }
    crate::utils::validate_sql_identifier(plan.table).context("Invalid table name in plan")?;

    let column_list = plan
        .columns
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!("SELECT {} FROM {}", column_list, quote_ident(plan.table));

    tracing::debug!(table = plan.table, "Reading source rows");

    let mut stmt = conn
        .prepare(&query)
        .with_context(|| format!("Failed to prepare read for table '{}'", plan.table))?;

    let column_count = plan.columns.len();
    let rows = stmt
        .query_map([], |row| {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(row.get::<_, Value>(idx)?);
            }
            Ok(values)
        })
        .with_context(|| format!("Failed to query rows from table '{}'", plan.table))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read rows from table '{}'", plan.table))?;

    tracing::info!(
        table = plan.table,
        rows = rows.len(),
        "Read source table"
    );

    Ok(rows)
}

/// Row count for a single table, used by validate and verify.
pub fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    crate::utils::validate_sql_identifier(table).context("Invalid table name for row count")?;

    let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let count: i64 = conn
        .query_row(&query, [], |row| row.get(0))
        .with_context(|| format!("Failed to count rows in table '{}'", table))?;

    Ok(count as usize)
}
