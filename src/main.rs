#![forbid(unsafe_code)]

//! `ceo-inbox` — scheduled alert scanning and inbox triage server.
//!
//! Bootstraps configuration, opens the `SQLite` inbox, registers the
//! configured alert jobs with the scheduler, and serves the inbox API
//! until Ctrl-C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use ceo_inbox::config::GlobalConfig;
use ceo_inbox::dispatch::Dispatcher;
use ceo_inbox::http;
use ceo_inbox::notify::LogNotifier;
use ceo_inbox::persistence::db;
use ceo_inbox::persistence::inbox_repo::InboxRepo;
use ceo_inbox::scheduler::Scheduler;
use ceo_inbox::workflow::InboxWorkflow;
use ceo_inbox::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "ceo-inbox", about = "Scheduled alert inbox server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the database path from the configuration file.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("ceo-inbox server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }
    info!(jobs = config.jobs.len(), "configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.db_path).await?);
    info!(path = %config.db_path.display(), "database connected");

    let repo = InboxRepo::new(Arc::clone(&db));
    let dispatcher = Dispatcher::new(repo.clone());
    let workflow = InboxWorkflow::new(dispatcher.clone(), repo);

    // ── Start scheduler ─────────────────────────────────
    let scheduler = Scheduler::with_notifier(dispatcher, Arc::new(LogNotifier));
    for job in config.enabled_jobs() {
        scheduler.register(job.to_job());
    }
    scheduler.start();

    // ── Start HTTP transport ────────────────────────────
    let ct = CancellationToken::new();
    let listener = http::bind(config.http_port).await?;
    let http_ct = ct.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(err) = http::serve(listener, workflow, http_ct).await {
            error!(%err, "http transport failed");
        }
    });

    info!("ceo-inbox ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    // In-flight ticks finish their batch before the pool closes.
    scheduler.shutdown().await;
    let _ = http_handle.await;
    db.close().await;
    info!("ceo-inbox shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
