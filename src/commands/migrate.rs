// ABOUTME: The migration run itself
// ABOUTME: Opens both stores, optionally truncates, and copies tables in order

use crate::config::MigrationConfig;
use crate::migration::{self, RowErrorPolicy};
use crate::plan::MIGRATION_PLAN;
use crate::postgres::{self, writer};
use crate::sqlite;
use anyhow::{Context, Result};

/// Run the full migration in dependency order.
///
/// With `truncate`, the destination tables are cleared first (in one
/// statement, so foreign keys between them do not object) after an
/// interactive confirmation that `yes` skips.
pub async fn migrate(
    config: &MigrationConfig,
    policy: RowErrorPolicy,
    truncate: bool,
    yes: bool,
) -> Result<()> {
    tracing::info!(
        "Starting migration: {} -> PostgreSQL ({:?} row policy)",
        config.sqlite_path,
        policy
    );

    let sqlite = sqlite::open_sqlite(&config.sqlite_path)?;
    let mut pg = postgres::connect_with_retry(&config.postgres_url).await?;

    if truncate {
        if !yes && !confirm_truncate()? {
            tracing::info!("Migration cancelled");
            return Ok(());
        }
        // Reverse dependency order, purely for log readability
        let tables: Vec<&str> = MIGRATION_PLAN.iter().rev().map(|p| p.table).collect();
        writer::truncate_tables(&pg, &tables).await?;
    }

    let reports = migration::run(&sqlite, &mut pg, policy).await?;

    let mut total_succeeded = 0_usize;
    let mut total_failed = 0_usize;
    tracing::info!("Migration summary:");
    for report in &reports {
        tracing::info!(
            "  {}: {} copied, {} failed",
            report.table,
            report.succeeded,
            report.failed
        );
        total_succeeded += report.succeeded;
        total_failed += report.failed;
    }

    if total_failed > 0 {
        tracing::warn!(
            "Completed with {} rows copied and {} rows skipped; \
             re-run after fixing the reported rows",
            total_succeeded,
            total_failed
        );
    } else {
        tracing::info!("Completed: {} rows copied, no failures", total_succeeded);
    }

    Ok(())
}

fn confirm_truncate() -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(format!(
            "Truncate {} destination tables before copying?",
            MIGRATION_PLAN.len()
        ))
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}
