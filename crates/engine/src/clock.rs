//! Wall-clock capability.
//!
//! Everything that depends on "now" takes a [`Clock`] so tests can drive day
//! rollover deterministically instead of sleeping.

use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;

/// Source of the current wall-clock time, with its UTC offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Plain functions and closures are clocks too.
impl<F> Clock for F
where
    F: Fn() -> DateTime<FixedOffset> + Send + Sync,
{
    fn now(&self) -> DateTime<FixedOffset> {
        self()
    }
}

/// Real time, either in an explicit zone or in the host's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    timezone: Option<Tz>,
}

impl SystemClock {
    pub fn new(timezone: Option<Tz>) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).fixed_offset(),
            None => Local::now().fixed_offset(),
        }
    }
}
