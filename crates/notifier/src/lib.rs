//! Notification delivery.
//!
//! One [`Notifier`] per outbound channel:
//! - Webhook: JSON POST (`webhook`)
//! - Email: authenticated SMTP with STARTTLS (`email`)
//!
//! [`Channel`] picks one of them from configuration so the poll loop stays
//! independent of the transport. Delivery is a single attempt; the next
//! scheduled tick is the retry.

pub mod email;
pub mod webhook;

use std::future::Future;
use std::time::Duration;

use slotwatch_common::config::ChannelConfig;
use slotwatch_common::error::WatchError;
use slotwatch_common::types::NotificationIntent;

use crate::email::EmailNotifier;
use crate::webhook::WebhookNotifier;

/// Errors raised while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Transport failure, timeout or non-success response.
    #[error("delivery failed: {0}")]
    Network(String),

    /// The remote end rejected our credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The notifier could not be built from its settings.
    #[error("invalid notifier settings: {0}")]
    Config(String),
}

impl From<NotifyError> for WatchError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::Network(msg) => WatchError::Network(msg),
            NotifyError::Auth(msg) => WatchError::Auth(msg),
            NotifyError::Config(msg) => WatchError::Config(msg),
        }
    }
}

/// Trait that all delivery channels implement.
pub trait Notifier {
    /// Deliver one intent. Failures are reported, never panicked.
    fn send(
        &self,
        intent: &NotificationIntent,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    /// Human-readable channel name for logs.
    fn name(&self) -> &'static str;
}

/// The configured delivery channel.
pub enum Channel {
    Webhook(WebhookNotifier),
    Email(EmailNotifier),
}

impl Channel {
    pub fn from_config(config: &ChannelConfig, timeout: Duration) -> Result<Self, NotifyError> {
        match config {
            ChannelConfig::Webhook { url } => {
                Ok(Channel::Webhook(WebhookNotifier::new(url.clone(), timeout)?))
            }
            ChannelConfig::Email(smtp) => Ok(Channel::Email(EmailNotifier::new(smtp, timeout)?)),
        }
    }
}

impl Notifier for Channel {
    async fn send(&self, intent: &NotificationIntent) -> Result<(), NotifyError> {
        match self {
            Channel::Webhook(n) => n.send(intent).await,
            Channel::Email(n) => n.send(intent).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Channel::Webhook(n) => n.name(),
            Channel::Email(n) => n.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotwatch_common::config::SmtpConfig;

    #[test]
    fn test_error_maps_into_watch_error() {
        let err: WatchError = NotifyError::Auth("535 bad credentials".into()).into();
        assert!(matches!(err, WatchError::Auth(_)));

        let err: WatchError = NotifyError::Network("timed out".into()).into();
        assert!(matches!(err, WatchError::Network(_)));
    }

    #[test]
    fn test_channel_from_webhook_config() {
        let config = ChannelConfig::Webhook {
            url: "https://hooks.example.com/abc".into(),
        };
        let channel = Channel::from_config(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(channel.name(), "webhook");
    }

    #[tokio::test]
    async fn test_channel_from_email_config() {
        let config = ChannelConfig::Email(SmtpConfig {
            server: "smtp.example.com".into(),
            port: 587,
            sender: "watcher@example.com".into(),
            password: "secret".into(),
            recipient: "me@example.com".into(),
        });
        let channel = Channel::from_config(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(channel.name(), "email");
    }
}
