use std::future::Future;
use std::time::Duration;

use slotwatch_common::config::AppConfig;
use slotwatch_common::error::WatchError;
use slotwatch_common::types::{IntentKind, NotificationIntent, PollResult};
use slotwatch_engine::clock::Clock;
use slotwatch_engine::schedule::Schedule;
use slotwatch_engine::tracker::{AvailabilityTracker, MessageTemplates};
use slotwatch_notifier::Notifier;

use crate::detector::ElementDetector;
use crate::fetcher::PageFetcher;

/// What one successful tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub poll: PollResult,
    pub sent: Vec<IntentKind>,
}

/// Poller that repeatedly fetches the target page, tracks availability and
/// delivers notifications. One tick runs to completion before the next.
pub struct AvailabilityPoller<N, C> {
    fetcher: PageFetcher,
    detector: ElementDetector,
    tracker: AvailabilityTracker,
    notifier: N,
    clock: C,
    schedule: Schedule,
    error_cooldown: Duration,
    report_quiet_checks: bool,
    startup_notification: bool,
}

impl<N: Notifier, C: Clock> AvailabilityPoller<N, C> {
    pub fn new(config: &AppConfig, notifier: N, clock: C) -> Result<Self, WatchError> {
        let fetcher = PageFetcher::new(
            config.target_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let detector = ElementDetector::new(&config.element_selector)?;
        let tracker = AvailabilityTracker::starting_at(
            clock.now(),
            config.summary_time,
            MessageTemplates::new(config.resource_name.clone(), config.target_url.clone()),
        );

        Ok(Self {
            fetcher,
            detector,
            tracker,
            notifier,
            clock,
            schedule: Schedule::from_config(config),
            error_cooldown: Duration::from_secs(config.error_cooldown_secs),
            report_quiet_checks: config.report_quiet_checks,
            startup_notification: config.startup_notification,
        })
    }

    pub fn tracker(&self) -> &AvailabilityTracker {
        &self.tracker
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Start the polling loop. Runs until the task is dropped.
    pub async fn run(&mut self) {
        self.run_with(tokio::time::sleep).await
    }

    /// Polling loop with a caller-supplied sleep, so the delays between ticks
    /// can be observed.
    pub async fn run_with<S, F>(&mut self, mut sleep: S)
    where
        S: FnMut(Duration) -> F,
        F: Future<Output = ()>,
    {
        tracing::info!(
            url = %self.fetcher.url(),
            selector = %self.detector.selector(),
            channel = self.notifier.name(),
            schedule = ?self.schedule,
            summary_time = %self.tracker.state().summary_time,
            "Availability poller started"
        );

        if self.startup_notification {
            self.send_startup_ping().await;
        }

        if !self.schedule.runs_immediately() {
            let delay = self.schedule.delay_until_next(self.clock.now());
            tracing::info!(delay_secs = delay.as_secs(), "Waiting for first scheduled check");
            sleep(delay).await;
        }

        loop {
            let delay = match self.tick().await {
                Ok(_) => self.schedule.delay_until_next(self.clock.now()),
                Err(e) => {
                    let delay = self
                        .schedule
                        .delay_after_failure(self.clock.now(), self.error_cooldown);
                    tracing::error!(
                        error = %e,
                        retry_in_secs = delay.as_secs(),
                        "Tick failed, cooling down"
                    );
                    delay
                }
            };

            tracing::debug!(delay_secs = delay.as_secs(), "Sleeping until next tick");
            sleep(delay).await;
        }
    }

    /// Run one fetch → detect → track → notify cycle.
    ///
    /// The summary check runs even when the fetch fails, so an outage cannot
    /// hold back the daily update. The first fetch or delivery error is
    /// returned after every intent has been attempted.
    pub async fn tick(&mut self) -> Result<TickReport, WatchError> {
        let now = self.clock.now();

        let (poll, fetch_error) = match self.fetcher.fetch().await {
            Ok(content) => (PollResult::observed(now, self.detector.evaluate(&content)), None),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch target page");
                (PollResult::failed(now, e.kind()), Some(e))
            }
        };

        let mut intents: Vec<NotificationIntent> = Vec::new();
        intents.extend(self.tracker.observe(&poll));

        if poll.is_ok() && !poll.available {
            tracing::info!("No availability at this time");
            if self.schedule.is_fixed_times() && self.report_quiet_checks {
                intents.push(self.tracker.scheduled_check_report(now));
            }
        }

        if let Some(summary) = self.tracker.on_tick(now) {
            tracing::info!(date = %now.date_naive(), "Sending daily summary");
            intents.push(summary);
        }

        let (sent, delivery_error) = self.deliver(&intents).await;

        match fetch_error.or(delivery_error) {
            Some(e) => Err(e),
            None => Ok(TickReport { poll, sent }),
        }
    }

    /// Send each intent in order, continuing past failures.
    async fn deliver(
        &self,
        intents: &[NotificationIntent],
    ) -> (Vec<IntentKind>, Option<WatchError>) {
        let mut sent = Vec::with_capacity(intents.len());
        let mut first_error = None;

        for intent in intents {
            match self.notifier.send(intent).await {
                Ok(()) => sent.push(intent.kind),
                Err(e) => {
                    tracing::error!(
                        kind = %intent.kind,
                        channel = self.notifier.name(),
                        error = %e,
                        "Failed to send notification"
                    );
                    if first_error.is_none() {
                        first_error = Some(WatchError::from(e));
                    }
                }
            }
        }

        (sent, first_error)
    }

    async fn send_startup_ping(&self) {
        let ping = self.tracker.startup_ping(self.clock.now());
        if let Err(e) = self.notifier.send(&ping).await {
            tracing::warn!(error = %e, "Startup notification failed");
        }
    }
}
