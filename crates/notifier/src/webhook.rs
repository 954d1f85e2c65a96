//! Generic webhook delivery (Make.com, Zapier, self-hosted receivers).

use std::time::Duration;

use chrono::SecondsFormat;
use serde::Serialize;

use slotwatch_common::types::{IntentKind, NotificationIntent};

use crate::{Notifier, NotifyError};

/// JSON body posted to the webhook.
///
/// Carries both `event_type` and `title` so receivers keyed on either work.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub event_type: IntentKind,
    pub title: &'a str,
    pub message: &'a str,
    /// RFC 3339 with the local offset
    pub timestamp: String,
}

impl<'a> From<&'a NotificationIntent> for WebhookPayload<'a> {
    fn from(intent: &'a NotificationIntent) -> Self {
        Self {
            event_type: intent.kind,
            title: &intent.subject,
            message: &intent.body,
            timestamp: intent.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }
}

impl Notifier for WebhookNotifier {
    async fn send(&self, intent: &NotificationIntent) -> Result<(), NotifyError> {
        let payload = WebhookPayload::from(intent);

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Network(format!("webhook timed out: {e}"))
                } else {
                    NotifyError::Network(format!("webhook request failed: {e}"))
                }
            })?
            .error_for_status()
            .map_err(|e| NotifyError::Network(format!("webhook rejected notification: {e}")))?;

        tracing::info!(kind = %intent.kind, title = %intent.subject, "Notification sent via webhook");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
