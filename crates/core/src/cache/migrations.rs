//! Schema versions of the cache database.
//!
//! Version 1 creates `cache_stores` (one row per named store, in creation
//! order) and `cache_entries` (responses keyed by store and request hash,
//! removed with their store). Applied versions are recorded in `_migrations`.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Schema versions in ascending order, each with its SQL batch.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_cache_stores.sql"))];

/// Bring the cache schema up to the latest version.
///
/// Versions above the highest recorded one are applied in order; a database
/// already at the latest version is left untouched.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose SQL failed.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let applied: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > applied) {
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("cache schema v{version}: {e}")))?;
            conn.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tracing::debug!(version, "cache schema upgraded");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
