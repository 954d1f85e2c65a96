use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::ErrorKind;

/// Why a notification is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Availability observed for the first time today.
    Immediate,
    /// Report from a fixed-time check that found nothing.
    ScheduledCheck,
    /// Once-per-day rollup.
    DailySummary,
    /// The watcher has just started.
    StartupPing,
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentKind::Immediate => write!(f, "immediate"),
            IntentKind::ScheduledCheck => write!(f, "scheduled_check"),
            IntentKind::DailySummary => write!(f, "daily_summary"),
            IntentKind::StartupPing => write!(f, "startup_ping"),
        }
    }
}

/// Outcome of one fetch + detect pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub observed_at: DateTime<FixedOffset>,
    pub available: bool,
    /// Set when the fetch failed; `available` is meaningless in that case.
    pub error: Option<ErrorKind>,
}

impl PollResult {
    pub fn observed(observed_at: DateTime<FixedOffset>, available: bool) -> Self {
        Self {
            observed_at,
            available,
            error: None,
        }
    }

    pub fn failed(observed_at: DateTime<FixedOffset>, error: ErrorKind) -> Self {
        Self {
            observed_at,
            available: false,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A message ready for delivery on whichever channel is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationIntent {
    pub kind: IntentKind,
    /// Short title (e.g., "Subscription available!")
    pub subject: String,
    /// Detailed body message
    pub body: String,
    pub timestamp: DateTime<FixedOffset>,
}
