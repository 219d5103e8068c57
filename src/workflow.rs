//! Operator-facing triage surface over the inbox.

use tracing::info;

use crate::dispatch::Dispatcher;
use crate::models::inbox::{InboxEntry, InboxStatus};
use crate::persistence::inbox_repo::InboxRepo;
use crate::Result;

/// List, create, re-status and remove inbox entries.
///
/// Status values are validated here; the store itself accepts any
/// recognized status at any time, including backward moves.
#[derive(Clone)]
pub struct InboxWorkflow {
    dispatcher: Dispatcher,
    repo: InboxRepo,
}

impl InboxWorkflow {
    /// Build the workflow surface.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, repo: InboxRepo) -> Self {
        Self { dispatcher, repo }
    }

    /// All entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<InboxEntry>> {
        self.repo.list_all().await
    }

    /// Submit a manual alert through the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank message or `AppError::Db`
    /// if persistence fails.
    pub async fn create(&self, message: &str, priority: Option<&str>) -> Result<InboxEntry> {
        self.dispatcher.submit(message, priority).await
    }

    /// Move an entry to `status` (`pending`, `read` or `processed`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for any other status value,
    /// `AppError::NotFound` for an unknown id, or `AppError::Db`.
    pub async fn set_status(&self, id: i64, status: &str) -> Result<InboxEntry> {
        let status: InboxStatus = status.parse()?;
        let entry = self.repo.update_status(id, status).await?;
        info!(id, status = %entry.status, "inbox entry status updated");
        Ok(entry)
    }

    /// Delete an entry. Removing an unknown id returns `false`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn remove(&self, id: i64) -> Result<bool> {
        let removed = self.repo.delete(id).await?;
        info!(id, removed, "inbox entry remove requested");
        Ok(removed)
    }
}
