// ABOUTME: Pre-flight checks for a migration run
// ABOUTME: Confirms source tables are readable and destination tables exist

use crate::config::MigrationConfig;
use crate::plan::MIGRATION_PLAN;
use crate::postgres::{self, writer};
use crate::sqlite::{self, reader};
use crate::utils::quote_ident;
use anyhow::{bail, Context, Result};

/// Check both ends of the migration without writing anything.
///
/// The source must contain every planned table with every planned column;
/// the destination must already have the tables (the schema is owned by the
/// CMS, not by this tool).
pub async fn validate(config: &MigrationConfig) -> Result<()> {
    tracing::info!("Validating source database {}", config.sqlite_path);

    let sqlite = sqlite::open_sqlite(&config.sqlite_path)?;

    for plan in MIGRATION_PLAN {
        check_source_columns(&sqlite, plan)?;
        let count = reader::count_rows(&sqlite, plan.table)?;
        tracing::info!("  ✓ source '{}': {} rows", plan.table, count);
    }

    tracing::info!("Validating destination database");

    let pg = postgres::connect_with_retry(&config.postgres_url).await?;

    let mut missing = Vec::new();
    for plan in MIGRATION_PLAN {
        if writer::table_exists(&pg, plan.table).await? {
            tracing::info!("  ✓ destination '{}' exists", plan.table);
        } else {
            missing.push(plan.table);
        }
    }

    if !missing.is_empty() {
        bail!(
            "Destination is missing tables: {}. \
             Run the CMS against the destination once so it creates its schema.",
            missing.join(", ")
        );
    }

    tracing::info!("Validation passed, ready to migrate");
    Ok(())
}

/// Prepare a zero-row select of every planned column so a missing column
/// fails here instead of mid-copy.
fn check_source_columns(
    conn: &rusqlite::Connection,
    plan: &crate::plan::TablePlan,
) -> Result<()> {
    let column_list = plan
        .columns
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let probe = format!(
        "SELECT {} FROM {} LIMIT 0",
        column_list,
        quote_ident(plan.table)
    );

    conn.prepare(&probe)
        .map(|_| ())
        .with_context(|| format!("Source table '{}' is missing or incomplete", plan.table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::MIGRATION_PLAN;

    #[test]
    fn column_probe_passes_on_complete_table() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE organization_websites_template_lnk (
                id INTEGER PRIMARY KEY,
                organization_website_id INTEGER,
                website_template_id INTEGER,
                organization_website_ord REAL
            )",
            [],
        )
        .unwrap();

        assert!(check_source_columns(&conn, &MIGRATION_PLAN[2]).is_ok());
    }

    #[test]
    fn column_probe_fails_on_missing_column() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE organization_websites_template_lnk (id INTEGER PRIMARY KEY)",
            [],
        )
        .unwrap();

        assert!(check_source_columns(&conn, &MIGRATION_PLAN[2]).is_err());
    }

    #[test]
    fn column_probe_fails_on_missing_table() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        assert!(check_source_columns(&conn, &MIGRATION_PLAN[0]).is_err());
    }
}
