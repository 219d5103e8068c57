//! Single entry point that turns raw alerts into persisted inbox entries.

use tracing::{debug, warn};

use crate::models::inbox::{InboxEntry, Priority};
use crate::persistence::inbox_repo::InboxRepo;
use crate::Result;

/// Validates raw alerts and forwards them to the [`InboxRepo`].
///
/// Scheduled scans and manual submissions both go through
/// [`submit`](Self::submit), so validation is identical for every origin.
#[derive(Clone)]
pub struct Dispatcher {
    repo: InboxRepo,
}

impl Dispatcher {
    /// Create a dispatcher writing to `repo`.
    #[must_use]
    pub fn new(repo: InboxRepo) -> Self {
        Self { repo }
    }

    /// Normalize and persist one alert.
    ///
    /// Unrecognized or missing priorities become `medium`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank message (logged here and
    /// still returned) or `AppError::Db` if persistence fails.
    pub async fn submit(&self, raw_message: &str, raw_priority: Option<&str>) -> Result<InboxEntry> {
        let priority = Priority::normalize(raw_priority);

        match self.repo.create(raw_message, priority).await {
            Ok(entry) => {
                debug!(id = entry.id, priority = %entry.priority, "alert dispatched to inbox");
                Ok(entry)
            }
            Err(err) => {
                warn!(%err, raw_priority, "alert dispatch rejected");
                Err(err)
            }
        }
    }
}
