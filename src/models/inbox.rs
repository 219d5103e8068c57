//! CEO inbox entry model and its triage vocabulary.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Urgency attached to an inbox entry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Informational; can wait.
    Low,
    /// Default urgency.
    #[default]
    Medium,
    /// Needs attention today.
    High,
}

impl Priority {
    /// Normalize a raw priority string, falling back to [`Priority::Medium`].
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Missing or unrecognized values (e.g. `"urgent"`) yield `Medium`.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().to_ascii_lowercase().parse().ok())
            .unwrap_or_default()
    }

    /// Canonical lowercase name stored in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(AppError::Validation(format!("unknown priority: {other}"))),
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage status of an inbox entry.
///
/// The intended workflow moves forward from `Pending` to `Read` or
/// `Processed`, but the store accepts any value at any time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InboxStatus {
    /// Not yet looked at.
    #[default]
    Pending,
    /// Seen by an operator.
    Read,
    /// Acted upon.
    Processed,
}

impl InboxStatus {
    /// Canonical lowercase name stored in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Read => "read",
            Self::Processed => "processed",
        }
    }
}

impl FromStr for InboxStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "read" => Ok(Self::Read),
            "processed" => Ok(Self::Processed),
            other => Err(AppError::Validation(format!(
                "status must be one of pending, read, processed (got {other:?})"
            ))),
        }
    }
}

impl Display for InboxStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted, status-tracked alert awaiting triage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    /// Store-assigned identifier.
    pub id: i64,
    /// Trimmed alert text.
    pub message: String,
    /// Urgency.
    pub priority: Priority,
    /// Current triage status.
    pub status: InboxStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Trim `raw` and reject it when nothing is left.
///
/// # Errors
///
/// Returns `AppError::Validation` if the message is empty after trimming.
pub fn validate_message(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("message must not be empty".into()));
    }
    Ok(trimmed.to_owned())
}
