//! Schema migrations for the record database.
//!
//! Applied versions are tracked in a `_migrations` table so a database can
//! be reopened by any newer binary. Statements use CREATE IF NOT EXISTS,
//! so replaying against an up-to-date schema is harmless.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Ordered migration batches, one SQL file per schema version.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_records.sql"))];

/// Apply every migration newer than the database's recorded version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let applied = applied_version(conn)?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

/// Highest applied version, creating the tracking table on first open.
fn applied_version(conn: &tokio_rusqlite::rusqlite::Connection) -> Result<i64, Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let version =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

    Ok(version)
}
