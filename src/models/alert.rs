//! Candidate alerts produced by alert sources before dispatch.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A raw alert as emitted by an [`AlertSource`](crate::sources::AlertSource).
///
/// Nothing is validated here; the dispatcher trims the message and
/// normalizes the priority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateAlert {
    /// Alert text.
    pub message: String,
    /// Optional raw priority (`low`, `medium`, `high`).
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<String>,
}

impl CandidateAlert {
    /// Build a candidate alert.
    #[must_use]
    pub fn new(message: impl Into<String>, priority: Option<&str>) -> Self {
        Self {
            message: message.into(),
            priority: priority.map(str::to_owned),
        }
    }
}

/// Deserialize an optional raw priority. Non-string values read as absent.
///
/// # Errors
///
/// Fails only when the deserializer itself cannot produce a value.
pub fn lenient_priority<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => Some(raw),
        _ => None,
    })
}
