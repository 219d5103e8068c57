//! Alert source backed by a JSON feed file.
//!
//! External scanners (project delay, budget overrun, task reminders)
//! write their findings as a JSON array of `{ "message", "priority" }`
//! objects. Each scan re-reads the whole file.

use std::path::PathBuf;

use crate::models::alert::CandidateAlert;
use crate::AppError;

use super::{AlertSource, ScanFuture};

/// Reads candidate alerts from a JSON feed on every scan.
#[derive(Debug, Clone)]
pub struct FileAlertSource {
    path: PathBuf,
}

impl FileAlertSource {
    /// Create a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AlertSource for FileAlertSource {
    fn scan(&self) -> ScanFuture<'_> {
        Box::pin(async move {
            let raw = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
                AppError::Source(format!("cannot read feed {}: {err}", self.path.display()))
            })?;

            // An empty file means the upstream scanner found nothing.
            if raw.trim().is_empty() {
                return Ok(Vec::new());
            }

            serde_json::from_str::<Vec<CandidateAlert>>(&raw).map_err(|err| {
                AppError::Source(format!("invalid feed {}: {err}", self.path.display()))
            })
        })
    }
}
