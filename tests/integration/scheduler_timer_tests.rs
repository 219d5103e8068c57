//! Integration tests for recurrence-driven firing on a paused tokio clock.
//!
//! The database is opened before the clock is paused; the sources used
//! here never reach it, so no `SQLite` I/O races the virtual clock.

use std::sync::atomic::Ordering;
use std::time::Duration;

use ceo_inbox::scheduler::{JobState, Recurrence, ScheduledJob, Scheduler};

use super::test_helpers::{test_pipeline, FlakySource, GatedSource};

fn every_second() -> Recurrence {
    Recurrence::every(Duration::from_secs(1)).expect("interval")
}

#[tokio::test]
async fn job_keeps_firing_after_failed_ticks() {
    let (dispatcher, _repo) = test_pipeline().await;
    tokio::time::pause();

    let source = FlakySource::new();
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("flaky", every_second(), source.clone()));
    scheduler.start();

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(source.calls(), 3, "ticks at 1s, 2s and 3s despite failures");

    scheduler.shutdown().await;
}

#[tokio::test]
async fn start_and_stop_are_idempotent() {
    let (dispatcher, _repo) = test_pipeline().await;
    tokio::time::pause();

    let source = FlakySource::new();
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("flaky", every_second(), source.clone()));

    scheduler.start();
    scheduler.start();
    assert!(scheduler.is_running());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(source.calls(), 2, "a second start must not double the cadence");

    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_running());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(source.calls(), 2, "no ticks after stop");
}

#[tokio::test]
async fn restart_resumes_firing() {
    let (dispatcher, _repo) = test_pipeline().await;
    tokio::time::pause();

    let source = FlakySource::new();
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("flaky", every_second(), source.clone()));

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    scheduler.shutdown().await;
    assert_eq!(source.calls(), 1);

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(source.calls(), 2);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn overlapping_trigger_is_skipped_on_timer() {
    let (dispatcher, _repo) = test_pipeline().await;
    tokio::time::pause();

    let source = GatedSource::new(Vec::new());
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("slow", every_second(), source.clone()));
    scheduler.start();

    source.started.notified().await;
    // Triggers at 2s and 3s fire while the first tick is still blocked.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(scheduler.job_state("slow"), Some(JobState::Running));
    assert_eq!(source.calls(), 1);

    source.release.notify_one();
    scheduler.shutdown().await;
    assert_eq!(source.calls(), 1);
    assert_eq!(scheduler.job_state("slow"), Some(JobState::Idle));
}

#[tokio::test]
async fn stop_lets_in_flight_tick_finish() {
    let (dispatcher, _repo) = test_pipeline().await;
    tokio::time::pause();

    let source = GatedSource::new(Vec::new());
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("slow", every_second(), source.clone()));
    scheduler.start();

    source.started.notified().await;
    scheduler.stop();
    assert!(!source.finished.load(Ordering::SeqCst));

    source.release.notify_one();
    scheduler.shutdown().await;
    assert!(source.finished.load(Ordering::SeqCst));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn replacing_a_running_job_swaps_its_source() {
    let (dispatcher, _repo) = test_pipeline().await;
    tokio::time::pause();

    let old = FlakySource::new();
    let new = FlakySource::new();
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("job", every_second(), old.clone()));
    scheduler.start();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(old.calls(), 1);

    // The replacement loop starts its own cadence: ticks at 2.5s and 3.5s.
    scheduler.register(ScheduledJob::new("job", every_second(), new.clone()));
    tokio::time::sleep(Duration::from_millis(2700)).await;

    assert_eq!(old.calls(), 1);
    assert_eq!(new.calls(), 2);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn stop_on_a_firing_boundary_halts_the_job() {
    let (dispatcher, _repo) = test_pipeline().await;
    tokio::time::pause();

    let source = FlakySource::new();
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("flaky", every_second(), source.clone()));
    scheduler.start();

    // Wake exactly when the 2s firing is due, then stop.
    tokio::time::sleep(Duration::from_secs(2)).await;
    scheduler.stop();
    scheduler.shutdown().await;
    let at_stop = source.calls();
    assert!(at_stop <= 2, "at most the 1s and 2s ticks, got {at_stop}");

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(source.calls(), at_stop, "no ticks once stopped");
    assert_eq!(scheduler.job_state("flaky"), Some(JobState::Idle));
}
