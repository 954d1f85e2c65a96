//! Scheduling disciplines for the poll loop.
//!
//! Either a check every N seconds, or checks at fixed times of day plus an
//! end-of-day job. The daily summary decision lives in the tracker, so both
//! disciplines only decide *when* the next tick happens.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};

use slotwatch_common::config::AppConfig;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Never sleep less than this, so a clock sitting exactly on a slot cannot spin.
const MIN_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Check every `Duration`, indefinitely.
    Interval(Duration),
    /// Check at each of `check_times`, plus the end-of-day job at `end_of_day`.
    FixedTimes {
        check_times: Vec<NaiveTime>,
        end_of_day: NaiveTime,
    },
}

impl Schedule {
    pub fn from_config(config: &AppConfig) -> Self {
        if config.uses_fixed_times() {
            Schedule::FixedTimes {
                check_times: config.check_times.clone(),
                end_of_day: config.summary_time,
            }
        } else {
            Schedule::Interval(Duration::from_secs(config.check_interval_secs))
        }
    }

    pub fn is_fixed_times(&self) -> bool {
        matches!(self, Schedule::FixedTimes { .. })
    }

    /// Interval schedules check right away; fixed-time schedules wait for their first slot.
    pub fn runs_immediately(&self) -> bool {
        matches!(self, Schedule::Interval(_))
    }

    /// How long to sleep from `now` until the next tick.
    pub fn delay_until_next(&self, now: DateTime<FixedOffset>) -> Duration {
        match self {
            Schedule::Interval(every) => (*every).max(MIN_DELAY),
            Schedule::FixedTimes {
                check_times,
                end_of_day,
            } => {
                let now_secs = seconds_of_day(now.time());
                let next = check_times
                    .iter()
                    .chain(std::iter::once(end_of_day))
                    .map(|t| {
                        let slot = seconds_of_day(*t);
                        // Strictly after now; a slot at or before now is tomorrow's.
                        if slot > now_secs {
                            slot - now_secs
                        } else {
                            slot + SECONDS_PER_DAY - now_secs
                        }
                    })
                    .min()
                    .unwrap_or(SECONDS_PER_DAY);
                Duration::from_secs(next).max(MIN_DELAY)
            }
        }
    }

    /// How long to wait after a failed tick.
    ///
    /// Interval schedules retry after `cooldown`. Fixed-time schedules keep
    /// their slots and only push the next one out if it is sooner than `cooldown`.
    pub fn delay_after_failure(&self, now: DateTime<FixedOffset>, cooldown: Duration) -> Duration {
        match self {
            Schedule::Interval(_) => cooldown.max(MIN_DELAY),
            Schedule::FixedTimes { .. } => self.delay_until_next(now).max(cooldown),
        }
    }
}

fn seconds_of_day(t: NaiveTime) -> u64 {
    u64::from(t.num_seconds_from_midnight())
}
