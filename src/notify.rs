//! Outbound notification boundary for scanned alert batches.
//!
//! Delivering alerts to a communication channel (mail, chat) belongs to an
//! external collaborator. This crate only names the hand-off point.

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::models::alert::CandidateAlert;
use crate::Result;

/// Receives the candidate alerts produced by one scheduled tick.
pub trait AlertNotifier: Send + Sync {
    /// Hand a batch of alerts to the communication layer.
    ///
    /// # Errors
    ///
    /// Implementation-defined. The scheduler logs failures and moves on.
    fn notify<'a>(
        &'a self,
        job: &'a str,
        alerts: &'a [CandidateAlert],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Notifier that only records the batch in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
    fn notify<'a>(
        &'a self,
        job: &'a str,
        alerts: &'a [CandidateAlert],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            info!(job, count = alerts.len(), "alert batch ready for notification");
            Ok(())
        })
    }
}
