// ABOUTME: SQLite source database access for the migration
// ABOUTME: Provides path validation and read-only connections

pub mod converter;
pub mod reader;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Validate a SQLite file path before opening it.
///
/// Canonicalizes the path (resolving symlinks and relative components),
/// verifies it points at an existing regular file, and requires a
/// `.db`, `.sqlite`, or `.sqlite3` extension. Prevents path traversal
/// input like `../../../etc/passwd` from ever reaching the driver.
pub fn validate_sqlite_path(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        bail!("SQLite file path cannot be empty");
    }

    let canonical = PathBuf::from(path).canonicalize().with_context(|| {
        format!(
            "Failed to resolve SQLite file path '{}'. \
             File may not exist or may not be readable.",
            path
        )
    })?;

    if !canonical.is_file() {
        bail!("Path '{}' is not a regular file (may be a directory)", path);
    }

    match canonical.extension().and_then(|e| e.to_str()) {
        Some(ext) if ["db", "sqlite", "sqlite3"].contains(&ext) => {}
        Some(ext) => bail!(
            "Invalid SQLite file extension '{}'. Must be .db, .sqlite, or .sqlite3",
            ext
        ),
        None => bail!(
            "SQLite file '{}' has no extension. Must be .db, .sqlite, or .sqlite3",
            path
        ),
    }

    tracing::debug!("Validated SQLite path: {}", canonical.display());

    Ok(canonical)
}

/// Open the source database in read-only mode.
///
/// The migration never writes to the source, so the connection is opened
/// with `SQLITE_OPEN_READ_ONLY` and probed with a version query to catch
/// corrupted files early.
pub fn open_sqlite(path: &str) -> Result<rusqlite::Connection> {
    let canonical = validate_sqlite_path(path)?;

    tracing::info!("Opening SQLite database: {}", canonical.display());

    let conn = rusqlite::Connection::open_with_flags(
        &canonical,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
    )
    .with_context(|| format!("Failed to open SQLite database: {}", canonical.display()))?;

    let _version: String = conn
        .query_row("SELECT sqlite_version()", [], |row| row.get(0))
        .context("Failed to query SQLite version (database may be corrupted)")?;

    Ok(conn)
}
