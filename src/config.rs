//! Global configuration parsing and validation.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::scheduler::{Recurrence, ScheduledJob};
use crate::sources::file::FileAlertSource;
use crate::{AppError, Result};

fn default_http_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

/// One scheduled alert scan.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct JobConfig {
    /// Unique job name (e.g. `project-delay`).
    pub name: String,
    /// Recurrence rule such as `daily 09:00` or `every 15m`.
    pub schedule: Recurrence,
    /// JSON feed of candidate alerts written by the upstream scanner.
    pub feed: PathBuf,
    /// Disabled jobs are parsed but never registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl JobConfig {
    /// Build the scheduler record for this job, reading from its feed file.
    #[must_use]
    pub fn to_job(&self) -> ScheduledJob {
        ScheduledJob::new(
            self.name.clone(),
            self.schedule,
            Arc::new(FileAlertSource::new(self.feed.clone())),
        )
    }
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Path to the `SQLite` database file.
    pub db_path: PathBuf,
    /// HTTP port for the inbox API.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Scheduled alert scans.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Jobs that should be registered with the scheduler.
    #[must_use]
    pub fn enabled_jobs(&self) -> impl Iterator<Item = &JobConfig> {
        self.jobs.iter().filter(|job| job.enabled)
    }

    fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(AppError::Config("db_path must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if job.name.trim().is_empty() {
                return Err(AppError::Config("job name must not be empty".into()));
            }
            if !seen.insert(job.name.as_str()) {
                warn!(job = %job.name, "duplicate job name; the last definition wins");
            }
        }

        Ok(())
    }
}
