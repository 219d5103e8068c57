//! Integration tests for single scheduler ticks driven by `trigger`.
//!
//! Validates:
//! - Candidates are dispatched in source order
//! - A failing scan or candidate never aborts the job or the batch
//! - Overlapping ticks of the same job are skipped
//! - Distinct jobs run independently

use std::sync::Arc;
use std::time::Duration;

use ceo_inbox::models::alert::CandidateAlert;
use ceo_inbox::models::inbox::Priority;
use ceo_inbox::scheduler::{JobState, Recurrence, ScheduledJob, Scheduler, TickOutcome, TickReport};
use ceo_inbox::AppError;

use super::test_helpers::{test_pipeline, GatedSource, RecordingNotifier, ScriptedSource};

fn hourly() -> Recurrence {
    Recurrence::every(Duration::from_secs(3600)).expect("interval")
}

fn completed(outcome: TickOutcome) -> TickReport {
    match outcome {
        TickOutcome::Completed(report) => report,
        TickOutcome::Skipped => panic!("tick was skipped"),
    }
}

#[tokio::test]
async fn tick_dispatches_candidates_in_order() {
    let (dispatcher, repo) = test_pipeline().await;
    let source = ScriptedSource::new(vec![Ok(vec![
        CandidateAlert::new("Project X delayed 5 days", Some("high")),
        CandidateAlert::new("Expense E-7 over budget", Some("urgent")),
        CandidateAlert::new("Task T-3 due today", None),
    ])]);
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("alerts", hourly(), source));

    let report = completed(scheduler.trigger("alerts").await.expect("trigger"));
    assert_eq!(report.candidates, 3);
    assert_eq!(report.dispatched, 3);
    assert!(!report.source_failed);

    let entries = repo.list_all().await.expect("list");
    let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        ["Task T-3 due today", "Expense E-7 over budget", "Project X delayed 5 days"]
    );
    assert_eq!(entries[1].priority, Priority::Medium);
}

#[tokio::test]
async fn failed_scan_does_not_stop_next_tick() {
    let (dispatcher, repo) = test_pipeline().await;
    let source = ScriptedSource::new(vec![
        Err(AppError::Source("project db unreachable".into())),
        Ok(vec![CandidateAlert::new("Project X delayed 5 days", Some("high"))]),
    ]);
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("project-delay", hourly(), source.clone()));

    let first = completed(scheduler.trigger("project-delay").await.expect("tick 1"));
    assert!(first.source_failed);
    assert_eq!(first.dispatched, 0);
    assert_eq!(scheduler.job_state("project-delay"), Some(JobState::Idle));

    let second = completed(scheduler.trigger("project-delay").await.expect("tick 2"));
    assert!(!second.source_failed);
    assert_eq!(second.dispatched, 1);
    assert_eq!(source.calls(), 2);
    assert_eq!(repo.list_all().await.expect("list").len(), 1);
}

#[tokio::test]
async fn rejected_candidate_does_not_abort_batch() {
    let (dispatcher, repo) = test_pipeline().await;
    let source = ScriptedSource::new(vec![Ok(vec![
        CandidateAlert::new("first", None),
        CandidateAlert::new("   ", Some("high")),
        CandidateAlert::new("third", None),
    ])]);
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("mixed", hourly(), source));

    let report = completed(scheduler.trigger("mixed").await.expect("trigger"));
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.rejected, 1);

    let messages: Vec<String> = repo
        .list_all()
        .await
        .expect("list")
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(messages, ["third", "first"]);
}

#[tokio::test]
async fn overlapping_tick_of_same_job_is_skipped() {
    let (dispatcher, repo) = test_pipeline().await;
    let source = GatedSource::new(vec![CandidateAlert::new("slow alert", None)]);
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("slow", hourly(), source.clone()));

    let background = scheduler.clone();
    let first = tokio::spawn(async move { background.trigger("slow").await });

    source.started.notified().await;
    assert_eq!(scheduler.job_state("slow"), Some(JobState::Running));

    let second = scheduler.trigger("slow").await.expect("second trigger");
    assert_eq!(second, TickOutcome::Skipped);

    source.release.notify_one();
    let report = completed(first.await.expect("join").expect("first trigger"));
    assert_eq!(report.dispatched, 1);

    assert_eq!(source.calls(), 1);
    assert_eq!(scheduler.job_state("slow"), Some(JobState::Idle));
    assert_eq!(repo.list_all().await.expect("list").len(), 1);
}

#[tokio::test]
async fn distinct_jobs_do_not_block_each_other() {
    let (dispatcher, _repo) = test_pipeline().await;
    let slow = GatedSource::new(Vec::new());
    let fast = ScriptedSource::new(vec![Ok(vec![CandidateAlert::new("budget", None)])]);
    let scheduler = Scheduler::new(dispatcher);
    scheduler.register(ScheduledJob::new("slow", hourly(), slow.clone()));
    scheduler.register(ScheduledJob::new("fast", hourly(), fast));

    let background = scheduler.clone();
    let slow_tick = tokio::spawn(async move { background.trigger("slow").await });
    slow.started.notified().await;

    let report = completed(scheduler.trigger("fast").await.expect("fast"));
    assert_eq!(report.dispatched, 1);

    slow.release.notify_one();
    completed(slow_tick.await.expect("join").expect("slow"));
}

#[tokio::test]
async fn duplicate_registration_replaces_job() {
    let (dispatcher, _repo) = test_pipeline().await;
    let old = ScriptedSource::new(Vec::new());
    let new = ScriptedSource::new(Vec::new());
    let scheduler = Scheduler::new(dispatcher);

    scheduler.register(ScheduledJob::new("reminder", hourly(), old.clone()));
    scheduler.register(ScheduledJob::new("reminder", hourly(), new.clone()));

    assert_eq!(scheduler.job_names(), ["reminder"]);
    completed(scheduler.trigger("reminder").await.expect("trigger"));
    assert_eq!(old.calls(), 0);
    assert_eq!(new.calls(), 1);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let (dispatcher, _repo) = test_pipeline().await;
    let scheduler = Scheduler::new(dispatcher);

    let err = scheduler.trigger("nope").await.expect_err("unknown");
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(scheduler.job_state("nope"), None);
}

#[tokio::test]
async fn notifier_receives_non_empty_batches_only() {
    let (dispatcher, _repo) = test_pipeline().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let source = ScriptedSource::new(vec![
        Ok(vec![CandidateAlert::new("Expense E-9 over budget", Some("high"))]),
        Ok(Vec::new()),
    ]);
    let scheduler = Scheduler::with_notifier(dispatcher, notifier.clone());
    scheduler.register(ScheduledJob::new("budget", hourly(), source));

    completed(scheduler.trigger("budget").await.expect("tick 1"));
    completed(scheduler.trigger("budget").await.expect("tick 2"));

    let batches = notifier.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].0, "budget");
    assert_eq!(batches[0].1[0].message, "Expense E-9 over budget");
}
