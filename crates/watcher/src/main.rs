use std::time::Duration;

use tracing_subscriber::EnvFilter;

use slotwatch_common::config::AppConfig;
use slotwatch_engine::clock::SystemClock;
use slotwatch_notifier::Channel;
use slotwatch_watcher::poller::AvailabilityPoller;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("slotwatch_watcher=info,slotwatch_engine=info,slotwatch_notifier=info")
    });
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!("SlotWatch starting...");

    // Load configuration
    let config = AppConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Missing or invalid configuration");
    })?;

    let notifier = Channel::from_config(
        &config.channel,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let clock = SystemClock::new(config.timezone);

    let mut poller = AvailabilityPoller::new(&config, notifier, clock)?;

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        _ = poller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("SlotWatch stopped.");
    Ok(())
}
