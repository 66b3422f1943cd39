//! Custom step model and its status state machine.
//!
//! A step's relative duration is parsed once at ingestion into a canonical
//! `StepDuration`; the human string form (`"2 hours"`) is a display-layer
//! derivative and is never re-parsed downstream. Step status is a single
//! tagged variant rather than independent `completed`/`current` booleans,
//! which makes states like "two current steps" unrepresentable.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit for a step's relative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes => write!(f, "minutes"),
            Self::Hours => write!(f, "hours"),
            Self::Days => write!(f, "days"),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Templates in the wild carry both singular and plural forms.
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" | "minutes" => Ok(Self::Minutes),
            "hour" | "hours" => Ok(Self::Hours),
            "day" | "days" => Ok(Self::Days),
            _ => Err(format!("Invalid time unit: {s}")),
        }
    }
}

/// Relative offset from order creation, e.g. `{value: 2, unit: hours}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDuration {
    pub value: i64,
    pub unit: TimeUnit,
}

impl StepDuration {
    pub fn new(value: i64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    /// Resolve to a concrete offset for scheduling arithmetic.
    pub fn as_offset(&self) -> Duration {
        match self.unit {
            TimeUnit::Minutes => Duration::minutes(self.value),
            TimeUnit::Hours => Duration::hours(self.value),
            TimeUnit::Days => Duration::days(self.value),
        }
    }

    /// An effectively-zero duration schedules the step at order creation time.
    pub fn is_zero(&self) -> bool {
        self.value <= 0
    }
}

impl fmt::Display for StepDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

impl FromStr for StepDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let value = parts
            .next()
            .ok_or_else(|| format!("Empty duration: {s:?}"))?
            .parse::<i64>()
            .map_err(|_| format!("Invalid duration value in {s:?}"))?;
        let unit = parts
            .next()
            .ok_or_else(|| format!("Missing time unit in {s:?}"))?
            .parse::<TimeUnit>()?;
        if parts.next().is_some() {
            return Err(format!("Trailing content in duration {s:?}"));
        }
        Ok(Self { value, unit })
    }
}

/// Step lifecycle: `Pending → Current → Completed`, strictly monotonic.
///
/// Only the advancer writes transitions; ingestion creates steps `Pending`
/// (or `Current` for a zero-duration first step) and never completes one
/// inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepStatus {
    /// Scheduled time has not arrived, or predecessors are still incomplete.
    Pending,
    /// The visible "in progress" step; at most one per order.
    Current,
    /// Done, with the sweep timestamp that promoted it.
    Completed { at: DateTime<Utc> },
}

impl StepStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Completed { at } => Some(*at),
            _ => None,
        }
    }
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Current => write!(f, "current"),
            Self::Completed { .. } => write!(f, "completed"),
        }
    }
}

/// One named stage of an order's fulfillment timeline.
///
/// `name` and `duration` are immutable after creation; only `status`
/// changes, and only through the advancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomStep {
    pub name: String,
    /// Customer-facing copy shown alongside the step, when configured.
    pub description: Option<String>,
    /// Canonical relative offset copied from the product template.
    pub duration: StepDuration,
    /// Absolute time computed once at ingestion; the scheduling source of truth.
    pub scheduled_at: DateTime<Utc>,
    pub status: StepStatus,
}

impl CustomStep {
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    pub fn is_current(&self) -> bool {
        self.status.is_current()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.status.completed_at()
    }

    /// Human-readable relative form, e.g. `"2 hours"`. Display only.
    pub fn scheduled_for(&self) -> String {
        self.duration.to_string()
    }

    /// Due means the scheduled time has elapsed and the step is not completed.
    /// Whether it may actually be promoted still depends on its predecessors.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && self.scheduled_at <= now
    }
}
