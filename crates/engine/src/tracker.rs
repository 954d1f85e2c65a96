//! Availability tracker: turns a stream of boolean observations plus wall-clock
//! time into notification decisions.
//!
//! Rules:
//! - the first positive observation of a calendar day emits one Immediate
//!   intent; later positives that day emit nothing;
//! - a DailySummary is emitted on the first tick where the date is past
//!   `last_summary_date` and the time of day is at or after `summary_time`;
//!   emitting it clears `found_today` and returns the tracker to `Idle`.
//!
//! The summary check is level-triggered on the current time, so long poll
//! intervals or a process that was asleep at the threshold still produce the
//! summary on the next tick.
//!
//! State is in-memory only. A restart simply starts over at "not found today".

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime};

use slotwatch_common::types::{IntentKind, NotificationIntent, PollResult};

/// Where the tracker is within the current summary period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    /// Nothing found since the last summary.
    Idle,
    /// Availability seen at least once since the last summary.
    FoundPending,
}

/// Day-scoped tracking state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    pub phase: DayPhase,
    pub found_today: bool,
    /// Date of the most recent summary. No further summary is sent on this date.
    pub last_summary_date: NaiveDate,
    pub summary_time: NaiveTime,
    /// Date of the most recent Immediate intent.
    pub last_immediate_date: Option<NaiveDate>,
}

impl TrackerState {
    pub fn new(last_summary_date: NaiveDate, summary_time: NaiveTime) -> Self {
        Self {
            phase: DayPhase::Idle,
            found_today: false,
            last_summary_date,
            summary_time,
            last_immediate_date: None,
        }
    }

    /// Whether the summary for `date` has already gone out.
    pub fn summary_sent_on(&self, date: NaiveDate) -> bool {
        self.last_summary_date >= date
    }
}

/// Wording used for the intents the tracker builds.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    /// e.g. "parking subscription"
    pub resource_name: String,
    pub target_url: String,
}

impl MessageTemplates {
    pub fn new(resource_name: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            target_url: target_url.into(),
        }
    }
}

/// Owns the [`TrackerState`] and is its only writer.
#[derive(Debug, Clone)]
pub struct AvailabilityTracker {
    state: TrackerState,
    messages: MessageTemplates,
}

impl AvailabilityTracker {
    pub fn new(state: TrackerState, messages: MessageTemplates) -> Self {
        Self { state, messages }
    }

    /// Tracker for a process starting at `now`.
    ///
    /// Started before `summary_time`: today's summary is still due.
    /// Started after it: the first summary goes out tomorrow, so a fresh
    /// process does not report on a day it barely watched.
    pub fn starting_at(
        now: DateTime<FixedOffset>,
        summary_time: NaiveTime,
        messages: MessageTemplates,
    ) -> Self {
        let today = now.date_naive();
        let last_summary_date = if now.time() >= summary_time {
            today
        } else {
            today.checked_sub_days(Days::new(1)).unwrap_or(today)
        };
        Self::new(TrackerState::new(last_summary_date, summary_time), messages)
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn phase(&self) -> DayPhase {
        self.state.phase
    }

    /// Apply one poll result. Failed polls change nothing.
    pub fn observe(&mut self, result: &PollResult) -> Option<NotificationIntent> {
        if let Some(kind) = result.error {
            tracing::debug!(error = %kind, "Skipping observation from failed poll");
            return None;
        }
        self.on_observation(result.available, result.observed_at)
    }

    /// Record an observation. Returns an Immediate intent for the first
    /// positive observation of the calendar day.
    pub fn on_observation(
        &mut self,
        available: bool,
        now: DateTime<FixedOffset>,
    ) -> Option<NotificationIntent> {
        if !available {
            return None;
        }

        let today = now.date_naive();
        let state = &mut self.state;
        state.found_today = true;
        state.phase = DayPhase::FoundPending;

        if state.last_immediate_date == Some(today) {
            return None;
        }
        state.last_immediate_date = Some(today);

        tracing::info!(date = %today, "Availability detected");
        Some(self.intent(
            IntentKind::Immediate,
            "Subscription available!".to_string(),
            format!(
                "A {} is now available! Check {}",
                self.messages.resource_name, self.messages.target_url
            ),
            now,
        ))
    }

    /// Decide whether the daily summary is due at `now`, emitting it at most
    /// once per calendar day.
    pub fn on_tick(&mut self, now: DateTime<FixedOffset>) -> Option<NotificationIntent> {
        let today = now.date_naive();
        if self.state.summary_sent_on(today) || now.time() < self.state.summary_time {
            return None;
        }

        let found = self.state.found_today;
        self.state.last_summary_date = today;
        self.state.found_today = false;
        self.state.phase = DayPhase::Idle;

        tracing::info!(date = %today, found, "Daily summary due");

        let body = if found {
            format!(
                "The watcher ran successfully and a {} was available at least once since the last update.",
                self.messages.resource_name
            )
        } else {
            format!(
                "The watcher ran successfully, but no spot available: no {} became available since the last update.",
                self.messages.resource_name
            )
        };
        Some(self.intent(IntentKind::DailySummary, "Daily Update".to_string(), body, now))
    }

    /// Report for a fixed-time check that found nothing.
    pub fn scheduled_check_report(&self, now: DateTime<FixedOffset>) -> NotificationIntent {
        self.intent(
            IntentKind::ScheduledCheck,
            "Scheduled check".to_string(),
            format!(
                "No spot available: no {} at the {} check.",
                self.messages.resource_name,
                now.format("%H:%M")
            ),
            now,
        )
    }

    /// Announcement that the watcher is up.
    pub fn startup_ping(&self, now: DateTime<FixedOffset>) -> NotificationIntent {
        self.intent(
            IntentKind::StartupPing,
            "Watcher started".to_string(),
            format!(
                "Watching {} for a {}. Daily update after {}.",
                self.messages.target_url,
                self.messages.resource_name,
                self.state.summary_time.format("%H:%M")
            ),
            now,
        )
    }

    fn intent(
        &self,
        kind: IntentKind,
        subject: String,
        body: String,
        timestamp: DateTime<FixedOffset>,
    ) -> NotificationIntent {
        NotificationIntent {
            kind,
            subject,
            body,
            timestamp,
        }
    }
}
