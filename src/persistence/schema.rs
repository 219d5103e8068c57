//! `SQLite` schema bootstrap logic.
//!
//! All definitions use `IF NOT EXISTS` and are safe to re-run on every
//! server startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply the inbox table definition to the connected `SQLite` database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS inbox_entry (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    message     TEXT NOT NULL CHECK(length(trim(message)) > 0),
    priority    TEXT NOT NULL CHECK(priority IN ('low','medium','high')),
    status      TEXT NOT NULL CHECK(status IN ('pending','read','processed')),
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_inbox_created_at ON inbox_entry(created_at);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
