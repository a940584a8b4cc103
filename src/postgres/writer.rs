// ABOUTME: Builds validated parameterized insert statements for the destination
// ABOUTME: Also clears destination tables ahead of an idempotent rerun

use crate::plan::TablePlan;
use crate::utils::{quote_ident, validate_sql_identifier};
use anyhow::{Context, Result};
use tokio_postgres::Client;

/// Build the parameterized insert statement for a planned table.
///
/// Every identifier is validated before being quoted into SQL text; all row
/// values travel as bind parameters.
///
/// # Examples
///
/// ```
/// # use strapi_postgres_migrator::plan::MIGRATION_PLAN;
/// # use strapi_postgres_migrator::postgres::writer::insert_sql;
/// let sql = insert_sql(&MIGRATION_PLAN[2]).unwrap();
/// assert_eq!(
///     sql,
///     "INSERT INTO \"organization_websites_template_lnk\" \
///      (\"id\", \"organization_website_id\", \"website_template_id\", \
///      \"organization_website_ord\") VALUES ($1, $2, $3, $4)"
/// );
/// ```
pub fn insert_sql(plan: &TablePlan) -> Result<String> {
    validate_sql_identifier(plan.table)
        .with_context(|| format!("Invalid destination table name '{}'", plan.table))?;
    for column in plan.columns {
        validate_sql_identifier(column.name).with_context(|| {
            format!(
                "Invalid destination column name '{}' for table '{}'",
                column.name, plan.table
            )
        })?;
    }

    let columns = plan
        .columns
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=plan.columns.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(plan.table),
        columns,
        placeholders
    ))
}

/// Truncate the destination tables ahead of a rerun.
///
/// All tables are truncated in one statement so that foreign keys between
/// them do not block the operation; the list is given in reverse dependency
/// order for readability in logs.
pub async fn truncate_tables(client: &Client, tables: &[&str]) -> Result<()> {
    if tables.is_empty() {
        return Ok(());
    }

    for table in tables {
        validate_sql_identifier(table)
            .with_context(|| format!("Invalid table name '{}' for truncate", table))?;
    }

    let list = tables
        .iter()
        .map(|t| quote_ident(t))
        .collect::<Vec<_>>()
        .join(", ");

    tracing::info!("Truncating destination tables: {}", tables.join(", "));

    let sql = format!("TRUNCATE TABLE {}", list);
    client
        .execute(&sql, &[])
        .await
        .with_context(|| format!("Failed to truncate destination tables ({})", list))?;

    Ok(())
}

/// Check that a table exists in the destination's public schema.
pub async fn table_exists(client: &Client, table: &str) -> Result<bool> {
    let row = client
        .query_one(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = 'public' AND table_name = $1",
            &[&table],
        )
        .await
        .with_context(|| format!("Failed to look up destination table '{}'", table))?;

    let count: i64 = row.get(0);
    Ok(count > 0)
}

/// Row count of a destination table, used by verify.
pub async fn count_rows(client: &Client, table: &str) -> Result<usize> {
    validate_sql_identifier(table).context("Invalid table name for row count")?;

    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let row = client
        .query_one(&sql, &[])
        .await
        .with_context(|| format!("Failed to count rows in destination table '{}'", table))?;

    let count: i64 = row.get(0);
    Ok(count as usize)
}
