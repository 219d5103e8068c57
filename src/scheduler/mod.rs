//! Periodic alert scanning with per-job failure isolation.
//!
//! A [`Scheduler`] owns its job table and trigger timers; nothing lives in
//! process-wide state, so several schedulers can coexist. Each registered
//! job gets a trigger loop that sleeps until its next firing and then
//! spawns one tick. A tick scans the job's [`AlertSource`], hands every
//! candidate to the [`Dispatcher`] in order, and swallows (logs) all
//! failures so the job keeps firing.
//!
//! At most one tick per job runs at a time. A trigger that fires while the
//! previous tick of the same job is still in flight is skipped. Distinct
//! jobs never wait on each other.
//!
//! [`stop`](Scheduler::stop) halts the trigger loops but never aborts a
//! tick mid-batch; [`shutdown`](Scheduler::shutdown) additionally waits
//! for in-flight ticks to drain.

pub mod job;
pub mod recurrence;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::dispatch::Dispatcher;
use crate::notify::AlertNotifier;
use crate::sources::AlertSource;
use crate::{AppError, Result};

pub use job::{JobState, ScheduledJob, TickOutcome, TickReport};
pub use recurrence::Recurrence;

/// Registered job plus its run guard and trigger-loop token.
struct JobSlot {
    job: ScheduledJob,
    busy: Arc<AtomicBool>,
    cancel: Option<CancellationToken>,
}

#[derive(Default)]
struct State {
    jobs: HashMap<String, JobSlot>,
    /// Present while the scheduler is started.
    root: Option<CancellationToken>,
}

struct Inner {
    dispatcher: Dispatcher,
    notifier: Option<Arc<dyn AlertNotifier>>,
    state: Mutex<State>,
    tracker: TaskTracker,
}

/// Clears the job's busy flag when the tick ends, even on panic.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of scheduled alert jobs.
///
/// Cloning yields another handle to the same scheduler. Trigger loops run
/// on the ambient tokio runtime, so [`start`](Self::start) and
/// [`register`](Self::register) on a started scheduler must be called from
/// within one.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create an idle scheduler feeding `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::build(dispatcher, None)
    }

    /// Create an idle scheduler that also hands each scanned batch to `notifier`.
    #[must_use]
    pub fn with_notifier(dispatcher: Dispatcher, notifier: Arc<dyn AlertNotifier>) -> Self {
        Self::build(dispatcher, Some(notifier))
    }

    fn build(dispatcher: Dispatcher, notifier: Option<Arc<dyn AlertNotifier>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                notifier,
                state: Mutex::new(State::default()),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Add a job. A job with the same name is replaced (last write wins).
    ///
    /// When the scheduler is running, the replaced job's trigger loop is
    /// cancelled and the new one starts immediately. The run guard carries
    /// over, so the replacement cannot overlap an in-flight tick of the
    /// job it replaces.
    pub fn register(&self, job: ScheduledJob) {
        let mut state = self.inner.lock();
        let name = job.name.clone();

        let busy = match state.jobs.remove(&name) {
            Some(previous) => {
                if let Some(cancel) = previous.cancel {
                    cancel.cancel();
                }
                info!(job = %name, "scheduled job replaced");
                previous.busy
            }
            None => Arc::default(),
        };

        let cancel = state.root.as_ref().map(|root| {
            let token = root.child_token();
            Inner::spawn_trigger_loop(&self.inner, name.clone(), job.recurrence, token.clone());
            token
        });

        info!(job = %name, recurrence = %job.recurrence, "scheduled job registered");
        state.jobs.insert(name, JobSlot { job, busy, cancel });
    }

    /// Begin firing every registered job. Calling it again is a no-op.
    pub fn start(&self) {
        let mut state = self.inner.lock();
        if state.root.is_some() {
            return;
        }

        let root = CancellationToken::new();
        self.inner.tracker.reopen();
        for (name, slot) in &mut state.jobs {
            let token = root.child_token();
            Inner::spawn_trigger_loop(&self.inner, name.clone(), slot.job.recurrence, token.clone());
            slot.cancel = Some(token);
        }
        state.root = Some(root);
        info!(jobs = state.jobs.len(), "scheduler started");
    }

    /// Stop future ticks. In-flight ticks run to completion. Idempotent.
    pub fn stop(&self) {
        let mut state = self.inner.lock();
        let Some(root) = state.root.take() else {
            return;
        };
        root.cancel();
        for slot in state.jobs.values_mut() {
            slot.cancel = None;
        }
        info!("scheduler stopped");
    }

    /// Stop the scheduler and wait until every in-flight tick has finished.
    pub async fn shutdown(&self) {
        self.stop();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }

    /// Whether trigger loops are currently active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.lock().root.is_some()
    }

    /// Fire one tick of `name` now, independent of its recurrence.
    ///
    /// Returns [`TickOutcome::Skipped`] if a tick of the same job is
    /// already running. Scan and dispatch failures are reported in the
    /// [`TickReport`], never as an error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no job is registered under `name`.
    pub async fn trigger(&self, name: &str) -> Result<TickOutcome> {
        self.inner.fire(name).await
    }

    /// Current run state of a job, if registered.
    #[must_use]
    pub fn job_state(&self, name: &str) -> Option<JobState> {
        self.inner.lock().jobs.get(name).map(|slot| {
            if slot.busy.load(Ordering::Acquire) {
                JobState::Running
            } else {
                JobState::Idle
            }
        })
    }

    /// Names of all registered jobs, sorted.
    #[must_use]
    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().jobs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_trigger_loop(
        inner: &Arc<Self>,
        name: String,
        recurrence: Recurrence,
        cancel: CancellationToken,
    ) {
        let span = info_span!("trigger_loop", job = %name);
        let this = Arc::clone(inner);

        inner.tracker.spawn(
            async move {
                loop {
                    let delay = recurrence.delay_from(Utc::now());
                    // Cancellation wins a tie with the timer.
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            debug!("trigger loop cancelled");
                            break;
                        }
                        () = tokio::time::sleep(delay) => {}
                    }

                    // The tick gets its own task so the loop keeps its cadence
                    // and an overlapping trigger can be detected and skipped.
                    let tick = Arc::clone(&this);
                    let job = name.clone();
                    this.tracker.spawn(
                        async move {
                            if let Err(err) = tick.fire(&job).await {
                                warn!(%err, "scheduled tick could not start");
                            }
                        }
                        .instrument(info_span!("tick", job = %name)),
                    );
                }
            }
            .instrument(span),
        );
    }

    async fn fire(&self, name: &str) -> Result<TickOutcome> {
        let (source, busy) = {
            let state = self.lock();
            let slot = state
                .jobs
                .get(name)
                .ok_or_else(|| AppError::NotFound(format!("scheduled job {name} not registered")))?;
            (Arc::clone(&slot.job.source), Arc::clone(&slot.busy))
        };

        let Some(_guard) = BusyGuard::acquire(busy) else {
            info!(job = name, "previous tick still running; skipping");
            return Ok(TickOutcome::Skipped);
        };

        Ok(TickOutcome::Completed(self.run_tick(name, source.as_ref()).await))
    }

    async fn run_tick(&self, name: &str, source: &dyn AlertSource) -> TickReport {
        let mut report = TickReport {
            job: name.to_owned(),
            ..TickReport::default()
        };

        let candidates = match source.scan().await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(job = name, %err, "alert scan failed");
                report.source_failed = true;
                Vec::new()
            }
        };
        report.candidates = candidates.len();

        for candidate in &candidates {
            match self
                .dispatcher
                .submit(&candidate.message, candidate.priority.as_deref())
                .await
            {
                Ok(_) => report.dispatched += 1,
                Err(err) => {
                    warn!(job = name, %err, "candidate alert not dispatched");
                    report.rejected += 1;
                }
            }
        }

        if let Some(notifier) = self.notifier.as_ref().filter(|_| !candidates.is_empty()) {
            if let Err(err) = notifier.notify(name, &candidates).await {
                warn!(job = name, %err, "alert notification failed");
            }
        }

        info!(
            job = name,
            candidates = report.candidates,
            dispatched = report.dispatched,
            rejected = report.rejected,
            source_failed = report.source_failed,
            "tick completed"
        );
        report
    }
}
