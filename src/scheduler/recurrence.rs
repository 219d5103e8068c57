//! Fixed recurrence rules for scheduled jobs.
//!
//! Supported forms:
//! - `every <N><unit>` with unit `s`, `m`, `h` or `d` (e.g. `every 15m`)
//! - `daily HH:MM` in UTC (e.g. `daily 09:00`)

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Timelike, Utc};
use serde::Deserialize;

use crate::{AppError, Result};

/// When a scheduled job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Recurrence {
    /// Fire repeatedly with a fixed gap between ticks.
    Every(Duration),
    /// Fire once per day at the given UTC wall-clock time.
    DailyAt(NaiveTime),
}

impl Recurrence {
    /// Fixed-interval recurrence.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a zero interval.
    pub fn every(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(AppError::Config("recurrence interval must be non-zero".into()));
        }
        Ok(Self::Every(interval))
    }

    /// Once-a-day recurrence at `hour:minute` UTC.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the time of day is out of range.
    pub fn daily_at(hour: u32, minute: u32) -> Result<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self::DailyAt)
            .ok_or_else(|| AppError::Config(format!("invalid time of day {hour:02}:{minute:02}")))
    }

    /// The first firing instant strictly after `now`.
    #[must_use]
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Every(interval) => TimeDelta::from_std(*interval)
                .ok()
                .and_then(|step| now.checked_add_signed(step))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Self::DailyAt(at) => {
                let today = now.date_naive().and_time(*at).and_utc();
                if today > now {
                    today
                } else {
                    today + TimeDelta::days(1)
                }
            }
        }
    }

    /// How long to sleep from `now` until the next firing.
    #[must_use]
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Self::Every(interval) => *interval,
            Self::DailyAt(_) => (self.next_after(now) - now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        }
    }
}

impl FromStr for Recurrence {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (kind, arg) = s
            .split_once(char::is_whitespace)
            .map(|(k, a)| (k, a.trim()))
            .ok_or_else(|| AppError::Config(format!("invalid schedule {s:?}")))?;

        match kind {
            "every" => {
                let split = arg
                    .find(|c: char| !c.is_ascii_digit())
                    .ok_or_else(|| AppError::Config(format!("missing unit in {s:?}")))?;
                let (count, unit) = arg.split_at(split);
                let count: u64 = count
                    .parse()
                    .map_err(|_| AppError::Config(format!("invalid interval in {s:?}")))?;
                let seconds = match unit {
                    "s" => count,
                    "m" => count.saturating_mul(60),
                    "h" => count.saturating_mul(3600),
                    "d" => count.saturating_mul(86_400),
                    other => {
                        return Err(AppError::Config(format!("unknown interval unit {other:?}")))
                    }
                };
                Self::every(Duration::from_secs(seconds))
            }
            "daily" => {
                let (hour, minute) = arg
                    .split_once(':')
                    .ok_or_else(|| AppError::Config(format!("expected HH:MM in {s:?}")))?;
                let hour = hour
                    .parse()
                    .map_err(|_| AppError::Config(format!("invalid hour in {s:?}")))?;
                let minute = minute
                    .parse()
                    .map_err(|_| AppError::Config(format!("invalid minute in {s:?}")))?;
                Self::daily_at(hour, minute)
            }
            other => Err(AppError::Config(format!("unknown schedule kind {other:?}"))),
        }
    }
}

impl TryFrom<String> for Recurrence {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Display for Recurrence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Every(interval) => write!(f, "every {}s", interval.as_secs()),
            Self::DailyAt(at) => write!(f, "daily {:02}:{:02}", at.hour(), at.minute()),
        }
    }
}
