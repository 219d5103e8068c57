//! CEO inbox repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::inbox::{validate_message, InboxEntry, InboxStatus, Priority};
use crate::{AppError, Result};

use super::db::Database;

/// Repository for inbox entries.
///
/// Every mutating call awaits the write before returning. Concurrent
/// updates to the same row are serialized by `SQLite`; the last write wins.
#[derive(Clone)]
pub struct InboxRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct InboxRow {
    id: i64,
    message: String,
    priority: String,
    status: String,
    created_at: String,
}

impl InboxRow {
    fn into_entry(self) -> Result<InboxEntry> {
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|_| AppError::Db(format!("invalid priority: {}", self.priority)))?;
        let status = self
            .status
            .parse::<InboxStatus>()
            .map_err(|_| AppError::Db(format!("invalid status: {}", self.status)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| AppError::Db(format!("invalid created_at: {e}")))?
            .with_timezone(&Utc);

        Ok(InboxEntry {
            id: self.id,
            message: self.message,
            priority,
            status,
            created_at,
        })
    }
}

/// Fixed-width UTC timestamps keep lexical and chronological order aligned.
fn timestamp_str(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl InboxRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new `pending` entry and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `message` is blank (nothing is
    /// written) or `AppError::Db` if the insert or read-back fails.
    pub async fn create(&self, message: &str, priority: Priority) -> Result<InboxEntry> {
        let message = validate_message(message)?;
        let created_at = timestamp_str(Utc::now());

        let result = sqlx::query(
            "INSERT INTO inbox_entry (message, priority, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&message)
        .bind(priority.as_str())
        .bind(InboxStatus::Pending.as_str())
        .bind(&created_at)
        .execute(self.db.as_ref())
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::Db(format!("inbox entry {id} missing after insert")))
    }

    /// Retrieve a single entry by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<InboxEntry>> {
        let row: Option<InboxRow> = sqlx::query_as(
            "SELECT id, message, priority, status, created_at FROM inbox_entry WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.db.as_ref())
        .await?;

        row.map(InboxRow::into_entry).transpose()
    }

    /// List every entry, newest first.
    ///
    /// Entries sharing a timestamp are ordered by descending id, so the
    /// result always reflects insertion order reversed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<InboxEntry>> {
        let rows: Vec<InboxRow> = sqlx::query_as(
            "SELECT id, message, priority, status, created_at FROM inbox_entry
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(InboxRow::into_entry).collect()
    }

    /// Set the status of an entry and return the refreshed record.
    ///
    /// Any status may be written regardless of the current one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no entry has `id`, or `AppError::Db`
    /// if the update fails.
    pub async fn update_status(&self, id: i64, status: InboxStatus) -> Result<InboxEntry> {
        let result = sqlx::query("UPDATE inbox_entry SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("inbox entry {id} not found")));
        }

        // A concurrent delete between the update and the read surfaces as
        // not-found as well.
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("inbox entry {id} not found")))
    }

    /// Delete an entry. Returns `false` when there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM inbox_entry WHERE id = ?1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
