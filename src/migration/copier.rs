// ABOUTME: Column-driven full-table copy from SQLite to PostgreSQL
// ABOUTME: One transaction per table, savepoint per row, explicit failure policy

use crate::plan::TablePlan;
use crate::postgres::types::PgValue;
use crate::postgres::writer;
use crate::sqlite::{converter, reader};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::types::Value;
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;

/// What to do when a single row fails to convert or insert.
///
/// The policy is explicit and applies to the whole run; mixing policies
/// across tables makes reruns impossible to reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowErrorPolicy {
    /// Roll the row back to its savepoint, log it, count it, and continue.
    /// The table's transaction still commits; safe for idempotent reruns.
    SkipAndReport,
    /// Fail the table on the first bad row; the transaction rolls back and
    /// nothing from this table is committed.
    Abort,
}

/// Outcome of copying one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    pub table: String,
    pub succeeded: usize,
    pub failed: usize,
}

impl CopyReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Copy every row of one planned table into the destination.
///
/// Reads all source rows in plan column order, applies the per-column
/// transforms, and inserts each row with a single parameterized statement
/// inside one destination transaction. Source-read failures are fatal;
/// per-row failures follow `policy`.
pub async fn copy_table(
    sqlite: &rusqlite::Connection,
    pg: &mut Client,
    plan: &TablePlan,
    policy: RowErrorPolicy,
) -> Result<CopyReport> {
    let rows = reader::read_rows(sqlite, plan)
        .with_context(|| format!("Failed to read source table '{}'", plan.table))?;

    tracing::info!(
        table = plan.table,
        rows = rows.len(),
        "Copying table to destination"
    );

    let sql = writer::insert_sql(plan)?;

    let mut tx = pg
        .transaction()
        .await
        .with_context(|| format!("Failed to open transaction for table '{}'", plan.table))?;
    let stmt = tx
        .prepare(&sql)
        .await
        .with_context(|| format!("Failed to prepare insert for table '{}'", plan.table))?;

    let progress = table_progress(plan.table, rows.len() as u64);

    let mut succeeded = 0_usize;
    let mut failed = 0_usize;

    for (idx, raw_row) in rows.into_iter().enumerate() {
        let row_id = row_identifier(&raw_row);

        let values = match convert_row(plan, raw_row) {
            Ok(values) => values,
            Err(e) => match policy {
                RowErrorPolicy::SkipAndReport => {
                    tracing::warn!(
                        table = plan.table,
                        row_id = %row_id,
                        error = %e,
                        "Row transform failed, skipping"
                    );
                    failed += 1;
                    progress.inc(1);
                    continue;
                }
                RowErrorPolicy::Abort => {
                    return Err(e.context(format!(
                        "Transform failed for row '{}' in table '{}'",
                        row_id, plan.table
                    )));
                }
            },
        };

        let params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();

        let savepoint = tx
            .savepoint(format!("row_{}", idx))
            .await
            .with_context(|| format!("Failed to create savepoint for table '{}'", plan.table))?;

        match savepoint.execute(&stmt, &params).await {
            Ok(_) => {
                savepoint.commit().await.with_context(|| {
                    format!("Failed to release savepoint for table '{}'", plan.table)
                })?;
                succeeded += 1;
            }
            Err(e) => match policy {
                RowErrorPolicy::SkipAndReport => {
                    savepoint.rollback().await.with_context(|| {
                        format!("Failed to roll back savepoint for table '{}'", plan.table)
                    })?;
                    tracing::warn!(
                        table = plan.table,
                        row_id = %row_id,
                        error = %e,
                        "Row insert failed, skipping"
                    );
                    failed += 1;
                }
                RowErrorPolicy::Abort => {
                    return Err(anyhow::Error::new(e).context(format!(
                        "Insert failed for row '{}' in table '{}'",
                        row_id, plan.table
                    )));
                }
            },
        }

        progress.inc(1);
    }

    progress.finish_and_clear();

    tx.commit()
        .await
        .with_context(|| format!("Failed to commit table '{}'", plan.table))?;

    tracing::info!(
        table = plan.table,
        succeeded,
        failed,
        "Table committed"
    );

    Ok(CopyReport {
        table: plan.table.to_string(),
        succeeded,
        failed,
    })
}

/// Apply the plan's transforms to one raw source row.
pub fn convert_row(plan: &TablePlan, raw: Vec<Value>) -> Result<Vec<PgValue>> {
    let mut values = Vec::with_capacity(raw.len());
    for (spec, value) in plan.columns.iter().zip(raw) {
        let converted = converter::convert_value(value, spec.transform)
            .with_context(|| format!("column '{}'", spec.name))?;
        values.push(converted);
    }
    Ok(values)
}

/// Human-readable identifier for a row, taken from its leading id column.
fn row_identifier(row: &[Value]) -> String {
    match row.first() {
        Some(Value::Integer(i)) => i.to_string(),
        Some(Value::Text(s)) => s.clone(),
        Some(Value::Real(f)) => f.to_string(),
        _ => "?".to_string(),
    }
}

fn table_progress(table: &'static str, len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::with_template("{msg:>36} [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    progress.set_message(table);
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::MIGRATION_PLAN;
    use serde_json::json;

    #[test]
    fn row_identifier_prefers_leading_column() {
        assert_eq!(row_identifier(&[Value::Integer(42)]), "42");
        assert_eq!(row_identifier(&[Value::Text("doc-a".into())]), "doc-a");
        assert_eq!(row_identifier(&[Value::Null]), "?");
        assert_eq!(row_identifier(&[]), "?");
    }

    #[test]
    fn convert_row_applies_each_columns_transform() {
        let website = &MIGRATION_PLAN[1];
        let raw = vec![
            Value::Integer(10),                                // id
            Value::Text("doc-x".into()),                       // document_id
            Value::Text("acme".into()),                        // subdomain
            Value::Integer(3),                                 // organization_id
            Value::Text("Acme".into()),                        // nome
            Value::Text(r#"{"color":"red"}"#.into()),          // contenuto
            Value::Integer(1),                                 // is_published
            Value::Integer(0),                                 // is_maintenance
            Value::Null,                                       // custom_domain
            Value::Text("Acme srl".into()),                    // seo_title
            Value::Null,                                       // seo_description
            Value::Null,                                       // seo_keywords
            Value::Null,                                       // analytics_id
            Value::Integer(1_700_000_000_000),                 // created_at (millis)
            Value::Integer(1_700_000_000),                     // updated_at (seconds)
            Value::Null,                                       // published_at
            Value::Integer(1),                                 // created_by_id
            Value::Null,                                       // updated_by_id
            Value::Text("it".into()),                          // locale
        ];

        let converted = convert_row(website, raw).unwrap();

        assert_eq!(converted[0], PgValue::BigInt(10));
        assert_eq!(converted[5], PgValue::Json(json!({"color": "red"})));
        assert_eq!(converted[6], PgValue::Bool(true));
        assert_eq!(converted[7], PgValue::Bool(false));
        assert_eq!(converted[8], PgValue::Null);
        // millis and seconds timestamps converge on the same instant
        assert_eq!(converted[13], converted[14]);
    }

    #[test]
    fn convert_row_surfaces_failing_column_name() {
        let website = &MIGRATION_PLAN[1];
        let mut raw = vec![Value::Null; website.columns.len()];
        raw[0] = Value::Integer(10);
        // is_published gets a value that cannot be coerced
        raw[6] = Value::Text("maybe".into());

        let err = convert_row(website, raw).unwrap_err();
        assert!(format!("{:#}", err).contains("is_published"));
    }

    #[test]
    fn copy_report_totals() {
        let report = CopyReport {
            table: "website_templates".into(),
            succeeded: 2,
            failed: 1,
        };
        assert_eq!(report.total(), 3);
    }
}
