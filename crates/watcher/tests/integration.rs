//! End-to-end ticks against a mock target page, with an injected clock and a
//! recording notifier.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeZone};
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use slotwatch_common::config::AppConfig;
use slotwatch_common::error::{ErrorKind, WatchError};
use slotwatch_common::types::{IntentKind, NotificationIntent};
use slotwatch_engine::clock::Clock;
use slotwatch_engine::tracker::DayPhase;
use slotwatch_notifier::{Notifier, NotifyError};
use slotwatch_watcher::poller::AvailabilityPoller;

const OPEN_PAGE: &str = r#"<html><body>
<form><button id="subscription-submit" type="submit">Souscrire</button></form>
</body></html>"#;

const FULL_PAGE: &str = r#"<html><body>
<form><button id="subscription-submit" type="submit" disabled>Complet</button></form>
</body></html>"#;

// ============================================================
// Shared helpers
// ============================================================

#[derive(Clone)]
struct ManualClock(Arc<Mutex<DateTime<FixedOffset>>>);

impl ManualClock {
    fn new(start: DateTime<FixedOffset>) -> Self {
        Self(Arc::new(Mutex::new(start)))
    }

    fn set(&self, now: DateTime<FixedOffset>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.0.lock().unwrap()
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<NotificationIntent>>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn kinds(&self) -> Vec<IntentKind> {
        self.sent.lock().unwrap().iter().map(|i| i.kind).collect()
    }

    fn last(&self) -> NotificationIntent {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, intent: &NotificationIntent) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Network("receiver down".into()));
        }
        self.sent.lock().unwrap().push(intent.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn at(day: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2025, 1, day, h, m, 0)
        .unwrap()
}

fn config(server: &MockServer, extra: &[(&str, &str)]) -> AppConfig {
    let mut env = vec![
        ("TARGET_URL".to_string(), format!("{}/parking", server.uri())),
        ("WEBHOOK_URL".to_string(), "http://127.0.0.1:9/unused".to_string()),
        ("SUMMARY_TIME".to_string(), "21:00".to_string()),
        ("REQUEST_TIMEOUT".to_string(), "5".to_string()),
    ];
    env.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    AppConfig::from_lookup(|key| {
        env.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

async fn serve(server: &MockServer, status: u16, body: &str) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/parking"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

// ============================================================
// Tests
// ============================================================

#[tokio::test]
async fn test_first_availability_notifies_once() {
    let server = MockServer::start().await;
    serve(&server, 200, OPEN_PAGE).await;

    let clock = ManualClock::new(at(1, 8, 0));
    let notifier = RecordingNotifier::default();
    let mut poller =
        AvailabilityPoller::new(&config(&server, &[]), notifier.clone(), clock.clone()).unwrap();

    clock.set(at(1, 9, 0));
    let report = poller.tick().await.unwrap();
    assert!(report.poll.available);
    assert_eq!(report.sent, vec![IntentKind::Immediate]);

    clock.set(at(1, 15, 0));
    let report = poller.tick().await.unwrap();
    assert!(report.sent.is_empty());

    assert_eq!(notifier.kinds(), vec![IntentKind::Immediate]);
    assert_eq!(poller.tracker().phase(), DayPhase::FoundPending);
}

#[tokio::test]
async fn test_daily_summary_reports_availability_and_resets() {
    let server = MockServer::start().await;
    serve(&server, 200, OPEN_PAGE).await;

    let clock = ManualClock::new(at(1, 8, 0));
    let notifier = RecordingNotifier::default();
    let mut poller =
        AvailabilityPoller::new(&config(&server, &[]), notifier.clone(), clock.clone()).unwrap();

    clock.set(at(1, 9, 0));
    poller.tick().await.unwrap();

    serve(&server, 200, FULL_PAGE).await;
    clock.set(at(1, 21, 30));
    let report = poller.tick().await.unwrap();
    assert!(!report.poll.available);
    assert_eq!(report.sent, vec![IntentKind::DailySummary]);
    assert!(notifier.last().body.contains("was available"));
    assert_eq!(notifier.last().timestamp, at(1, 21, 30));

    let state = poller.tracker().state();
    assert!(!state.found_today);
    assert_eq!(poller.tracker().phase(), DayPhase::Idle);

    // Same evening: no second summary.
    clock.set(at(1, 22, 30));
    assert!(poller.tick().await.unwrap().sent.is_empty());
}

#[tokio::test]
async fn test_quiet_day_summary() {
    let server = MockServer::start().await;
    serve(&server, 200, FULL_PAGE).await;

    let clock = ManualClock::new(at(1, 8, 0));
    let notifier = RecordingNotifier::default();
    let mut poller =
        AvailabilityPoller::new(&config(&server, &[]), notifier.clone(), clock.clone()).unwrap();

    for hour in [9, 12, 15, 18] {
        clock.set(at(1, hour, 0));
        assert!(poller.tick().await.unwrap().sent.is_empty());
    }

    clock.set(at(1, 21, 0));
    poller.tick().await.unwrap();
    assert_eq!(notifier.kinds(), vec![IntentKind::DailySummary]);
    assert!(notifier.last().body.contains("no spot available"));
}

#[tokio::test]
async fn test_fetch_failure_changes_nothing() {
    let server = MockServer::start().await;
    serve(&server, 503, "maintenance").await;

    let clock = ManualClock::new(at(1, 8, 0));
    let notifier = RecordingNotifier::default();
    let mut poller =
        AvailabilityPoller::new(&config(&server, &[]), notifier.clone(), clock.clone()).unwrap();

    let before = poller.tracker().state().clone();
    clock.set(at(1, 9, 0));
    let err = poller.tick().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(poller.tracker().state(), &before);
    assert!(notifier.kinds().is_empty());
}

#[tokio::test]
async fn test_summary_still_sent_during_outage() {
    let server = MockServer::start().await;
    serve(&server, 503, "maintenance").await;

    let clock = ManualClock::new(at(1, 8, 0));
    let notifier = RecordingNotifier::default();
    let mut poller =
        AvailabilityPoller::new(&config(&server, &[]), notifier.clone(), clock.clone()).unwrap();

    clock.set(at(1, 21, 0));
    assert!(poller.tick().await.is_err());
    assert_eq!(notifier.kinds(), vec![IntentKind::DailySummary]);
}

#[tokio::test]
async fn test_delivery_failure_is_reported_but_dedup_holds() {
    let server = MockServer::start().await;
    serve(&server, 200, OPEN_PAGE).await;

    let clock = ManualClock::new(at(1, 8, 0));
    let mut poller = AvailabilityPoller::new(
        &config(&server, &[]),
        RecordingNotifier::failing(),
        clock.clone(),
    )
    .unwrap();

    clock.set(at(1, 9, 0));
    let err = poller.tick().await.unwrap_err();
    assert!(matches!(err, WatchError::Network(_)));

    // The observation was recorded; a later positive does not retry the alert.
    clock.set(at(1, 10, 0));
    assert!(poller.tick().await.unwrap().sent.is_empty());
    assert!(poller.tracker().state().found_today);
}

#[tokio::test]
async fn test_fixed_times_quiet_check_report() {
    let server = MockServer::start().await;
    serve(&server, 200, FULL_PAGE).await;

    let clock = ManualClock::new(at(1, 6, 0));
    let notifier = RecordingNotifier::default();
    let config = config(
        &server,
        &[
            ("CHECK_TIMES", "07:00,11:59,17:00,23:00"),
            ("SUMMARY_TIME", "23:30"),
            ("REPORT_QUIET_CHECKS", "true"),
        ],
    );
    let mut poller = AvailabilityPoller::new(&config, notifier.clone(), clock.clone()).unwrap();
    assert!(poller.schedule().is_fixed_times());

    clock.set(at(1, 7, 0));
    let report = poller.tick().await.unwrap();
    assert_eq!(report.sent, vec![IntentKind::ScheduledCheck]);

    // End-of-day job: quiet report and the daily summary both go out.
    clock.set(at(1, 23, 30));
    let report = poller.tick().await.unwrap();
    assert_eq!(
        report.sent,
        vec![IntentKind::ScheduledCheck, IntentKind::DailySummary]
    );
}

#[tokio::test]
async fn test_summary_sent_when_end_of_day_check_runs_late() {
    let server = MockServer::start().await;
    serve(&server, 200, FULL_PAGE).await;

    let clock = ManualClock::new(at(1, 6, 0));
    let notifier = RecordingNotifier::default();
    let config = config(
        &server,
        &[("CHECK_TIMES", "07:00,23:00"), ("SUMMARY_TIME", "23:30")],
    );
    let mut poller = AvailabilityPoller::new(&config, notifier.clone(), clock.clone()).unwrap();

    // A cooldown pushed the last check of the day past the summary slot.
    clock.set(at(1, 23, 35));
    let report = poller.tick().await.unwrap();
    assert_eq!(report.sent, vec![IntentKind::DailySummary]);
    assert_eq!(poller.tracker().state().last_summary_date, at(1, 0, 0).date_naive());
}

#[tokio::test]
async fn test_run_loop_pings_then_recovers_after_failed_tick() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/parking"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/parking"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OPEN_PAGE))
        .mount(&server)
        .await;

    let clock = ManualClock::new(at(1, 9, 0));
    let notifier = RecordingNotifier::default();
    let config = config(
        &server,
        &[("STARTUP_NOTIFICATION", "true"), ("ERROR_COOLDOWN", "300")],
    );
    let mut poller = AvailabilityPoller::new(&config, notifier.clone(), clock.clone()).unwrap();

    let delays = Arc::new(Mutex::new(Vec::new()));
    let stop = Arc::new(Notify::new());
    let sleeper = {
        let delays = delays.clone();
        let stop = stop.clone();
        move |delay: Duration| -> Pin<Box<dyn Future<Output = ()>>> {
            let mut recorded = delays.lock().unwrap();
            recorded.push(delay);
            if recorded.len() >= 2 {
                stop.notify_one();
                Box::pin(std::future::pending())
            } else {
                Box::pin(std::future::ready(()))
            }
        }
    };

    tokio::select! {
        _ = poller.run_with(sleeper) => unreachable!("poll loop returned"),
        _ = stop.notified() => {}
    }

    // Failed tick waits out the cooldown, the next one uses the interval.
    assert_eq!(
        *delays.lock().unwrap(),
        vec![Duration::from_secs(300), Duration::from_secs(3600)]
    );
    assert_eq!(
        notifier.kinds(),
        vec![IntentKind::StartupPing, IntentKind::Immediate]
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_selector_rejected_at_startup() {
    let server = MockServer::start().await;
    let config = config(&server, &[("ELEMENT_SELECTOR", "button[")]);

    let result = AvailabilityPoller::new(
        &config,
        RecordingNotifier::default(),
        ManualClock::new(at(1, 8, 0)),
    );
    assert!(matches!(result, Err(WatchError::Config(_))));
}
