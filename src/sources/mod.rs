//! Pluggable alert producers scanned by the scheduler.
//!
//! The business predicates that decide whether a project is delayed, an
//! expense is over budget, or a task needs a reminder live outside this
//! crate. They reach the pipeline through the [`AlertSource`] trait.

pub mod file;

use std::future::Future;
use std::pin::Pin;

use crate::models::alert::CandidateAlert;
use crate::Result;

/// Boxed future returned by [`AlertSource::scan`].
pub type ScanFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<CandidateAlert>>> + Send + 'a>>;

/// A producer of candidate alerts.
///
/// Implementations hold no scheduling state; the scheduler decides when
/// to call [`scan`](Self::scan).
pub trait AlertSource: Send + Sync {
    /// Scan domain state and return zero or more candidate alerts, in the
    /// order they should be dispatched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Source` (or any other error) when the scan fails.
    /// Scheduled ticks log the failure and treat it as zero candidates.
    fn scan(&self) -> ScanFuture<'_>;
}
