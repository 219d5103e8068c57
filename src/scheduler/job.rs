//! Scheduled job records and tick results.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::sources::AlertSource;

use super::recurrence::Recurrence;

/// A named alert scan bound to a recurrence rule.
#[derive(Clone)]
pub struct ScheduledJob {
    /// Unique job name; re-registering a name replaces the job.
    pub name: String,
    /// When the job fires.
    pub recurrence: Recurrence,
    /// Producer scanned on every tick.
    pub source: Arc<dyn AlertSource>,
}

impl ScheduledJob {
    /// Build a job record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        recurrence: Recurrence,
        source: Arc<dyn AlertSource>,
    ) -> Self {
        Self {
            name: name.into(),
            recurrence,
            source,
        }
    }
}

impl fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("name", &self.name)
            .field("recurrence", &self.recurrence)
            .finish_non_exhaustive()
    }
}

/// Per-job run state. A failed tick returns to `Idle` like a successful one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for the next trigger.
    Idle,
    /// A tick is in flight.
    Running,
}

/// Summary of one completed tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Job that ran.
    pub job: String,
    /// Candidates returned by the source (zero when the scan failed).
    pub candidates: usize,
    /// Candidates persisted to the inbox.
    pub dispatched: usize,
    /// Candidates the dispatcher refused or failed to persist.
    pub rejected: usize,
    /// Whether the scan itself failed.
    pub source_failed: bool,
}

/// Result of asking a job to fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick ran to completion.
    Completed(TickReport),
    /// A previous tick of the same job was still running.
    Skipped,
}
