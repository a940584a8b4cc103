// ABOUTME: Migration orchestration
// ABOUTME: Runs the table copier over the plan in dependency order

pub mod copier;

pub use copier::{copy_table, CopyReport, RowErrorPolicy};

use crate::plan::MIGRATION_PLAN;
use anyhow::Result;
use tokio_postgres::Client;

/// Copy every planned table in dependency order.
///
/// Templates and websites land before the link table that references them,
/// so the destination's referential constraints are never violated by
/// ordering. A fatal error on any table stops the run; tables already
/// committed stay committed.
pub async fn run(
    sqlite: &rusqlite::Connection,
    pg: &mut Client,
    policy: RowErrorPolicy,
) -> Result<Vec<CopyReport>> {
    let mut reports = Vec::with_capacity(MIGRATION_PLAN.len());

    for (phase, plan) in MIGRATION_PLAN.iter().enumerate() {
        tracing::info!(
            "Phase {}/{}: copying '{}'",
            phase + 1,
            MIGRATION_PLAN.len(),
            plan.table
        );
        let report = copy_table(sqlite, pg, plan, policy).await?;
        reports.push(report);
    }

    Ok(reports)
}
