//! Notification sinks.

use async_trait::async_trait;
use gcoin_shared::EmailService;
use gcoin_shared::types::UserId;
use thiserror::Error;
use tracing::info;

use crate::events::identity::UserDisplayInfo;

/// A rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Event that produced this message.
    pub event: &'static str,
    /// Recipient.
    pub recipient_id: UserId,
    /// Recipient details, when the identity lookup knows them.
    pub recipient: Option<UserDisplayInfo>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Recipient has no address for this channel.
    #[error("No delivery address for user {0}")]
    NoAddress(UserId),
    /// The channel refused or failed the delivery.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Best-effort delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &'static str;

    /// Delivers one notification.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            event = notification.event,
            recipient_id = %notification.recipient_id,
            subject = %notification.subject,
            "Notification"
        );
        Ok(())
    }
}

/// Sends notifications over SMTP.
#[derive(Clone)]
pub struct EmailNotifier {
    email: EmailService,
}

impl EmailNotifier {
    /// Wraps an email service.
    #[must_use]
    pub const fn new(email: EmailService) -> Self {
        Self { email }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let address = notification
            .recipient
            .as_ref()
            .and_then(|r| r.email.as_deref())
            .ok_or(NotifyError::NoAddress(notification.recipient_id))?;

        self.email
            .send_email(address, &notification.subject, &notification.body)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}
