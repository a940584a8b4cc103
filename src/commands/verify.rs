// ABOUTME: Post-run integrity check
// ABOUTME: Compares per-table row counts between source and destination

use crate::config::MigrationConfig;
use crate::plan::MIGRATION_PLAN;
use crate::postgres::{self, writer};
use crate::sqlite::{self, reader};
use anyhow::{bail, Result};

/// Compare row counts for every planned table.
///
/// A count mismatch exits non-zero so scripted runs can detect an
/// incomplete copy; matching counts do not prove field-level equality,
/// but they catch the failure modes this tool actually has (skipped or
/// missing rows).
pub async fn verify(config: &MigrationConfig) -> Result<()> {
    let sqlite = sqlite::open_sqlite(&config.sqlite_path)?;
    let pg = postgres::connect_with_retry(&config.postgres_url).await?;

    let mut mismatched = Vec::new();

    for plan in MIGRATION_PLAN {
        let source_count = reader::count_rows(&sqlite, plan.table)?;
        let dest_count = writer::count_rows(&pg, plan.table).await?;

        if source_count == dest_count {
            tracing::info!("  ✓ {}: {} rows on both sides", plan.table, source_count);
        } else {
            tracing::warn!(
                "  ✗ {}: source has {} rows, destination has {}",
                plan.table,
                source_count,
                dest_count
            );
            mismatched.push(plan.table);
        }
    }

    if !mismatched.is_empty() {
        bail!(
            "Row counts differ for: {}. Re-run the migration for the affected tables.",
            mismatched.join(", ")
        );
    }

    tracing::info!("Verification passed: all row counts match");
    Ok(())
}
