//! Email delivery over authenticated SMTP with STARTTLS.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use slotwatch_common::config::SmtpConfig;
use slotwatch_common::types::NotificationIntent;

use crate::{Notifier, NotifyError};

/// SMTP reply codes that mean the server refused our login.
const AUTH_FAILURE_CODES: &[&str] = &["530", "534", "535"];

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|e| NotifyError::Config(format!("invalid SMTP_SERVER: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Self::with_transport(transport, config)
    }

    fn with_transport(
        transport: AsyncSmtpTransport<Tokio1Executor>,
        config: &SmtpConfig,
    ) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .sender
            .parse()
            .map_err(|e| NotifyError::Config(format!("invalid SENDER_EMAIL: {e}")))?;
        let to: Mailbox = config
            .recipient
            .parse()
            .map_err(|e| NotifyError::Config(format!("invalid RECIPIENT_EMAIL: {e}")))?;

        Ok(Self { transport, from, to })
    }

    /// Build the plain-text message for an intent.
    pub fn build_message(&self, intent: &NotificationIntent) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(intent.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "{}\n\nSent at {}",
                intent.body,
                intent.timestamp.format("%Y-%m-%d %H:%M:%S %:z")
            ))
            .map_err(|e| NotifyError::Config(format!("failed to build email: {e}")))
    }
}

/// Sort an SMTP failure into our taxonomy.
fn classify(err: lettre::transport::smtp::Error) -> NotifyError {
    let code = err.status().map(|c| c.to_string());
    match code {
        Some(code) if AUTH_FAILURE_CODES.contains(&code.as_str()) => {
            NotifyError::Auth(format!("SMTP login rejected ({code}): {err}"))
        }
        _ if err.is_timeout() => NotifyError::Network(format!("SMTP timed out: {err}")),
        _ => NotifyError::Network(format!("SMTP delivery failed: {err}")),
    }
}

impl Notifier for EmailNotifier {
    async fn send(&self, intent: &NotificationIntent) -> Result<(), NotifyError> {
        let message = self.build_message(intent)?;
        self.transport.send(message).await.map_err(classify)?;

        tracing::info!(kind = %intent.kind, subject = %intent.subject, "Notification sent via email");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
