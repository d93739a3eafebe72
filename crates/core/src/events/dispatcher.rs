//! Outbox consumer.
//!
//! Runs on its own task, renders each event into per-recipient messages and
//! hands them to every notifier under a timeout. Failures are logged and
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use gcoin_shared::types::{Money, UserId};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::event::LedgerEvent;
use crate::events::identity::{IdentityLookup, display_info_within, display_label};
use crate::events::notifier::{Notification, Notifier};

/// Delivers ledger events to users.
pub struct NotificationDispatcher {
    identity: Arc<dyn IdentityLookup>,
    notifiers: Vec<Arc<dyn Notifier>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    /// Creates a dispatcher with no notifiers.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityLookup>, timeout: Duration) -> Self {
        Self {
            identity,
            notifiers: Vec::new(),
            timeout,
        }
    }

    /// Adds a delivery channel.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Consumes the outbox until every publisher is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<LedgerEvent>) {
        info!(notifiers = self.notifiers.len(), "Notification dispatcher started");
        while let Some(event) = rx.recv().await {
            self.dispatch(&event).await;
        }
        info!("Notification outbox closed, dispatcher stopping");
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    pub fn spawn(self, rx: mpsc::Receiver<LedgerEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    /// Delivers one event; returns how many deliveries succeeded.
    pub async fn dispatch(&self, event: &LedgerEvent) -> usize {
        let mut delivered = 0;
        for notification in self.render(event).await {
            for notifier in &self.notifiers {
                match tokio::time::timeout(self.timeout, notifier.notify(&notification)).await {
                    Ok(Ok(())) => {
                        delivered += 1;
                        debug!(
                            event = notification.event,
                            channel = notifier.name(),
                            recipient_id = %notification.recipient_id,
                            "Notification delivered"
                        );
                    }
                    Ok(Err(e)) => warn!(
                        event = notification.event,
                        channel = notifier.name(),
                        recipient_id = %notification.recipient_id,
                        error = %e,
                        "Notification failed"
                    ),
                    Err(_) => warn!(
                        event = notification.event,
                        channel = notifier.name(),
                        recipient_id = %notification.recipient_id,
                        timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                        "Notification timed out"
                    ),
                }
            }
        }
        delivered
    }

    /// Renders the messages an event produces, one per interested user.
    ///
    /// Identity lookups share the delivery timeout.
    pub async fn render(&self, event: &LedgerEvent) -> Vec<Notification> {
        let identity = self.identity.as_ref();
        let within = self.timeout;
        match event {
            LedgerEvent::WalletCreated {
                user_id,
                initial_balance,
                ..
            } => vec![
                self.message(
                    event,
                    *user_id,
                    "Welcome to G Coin".to_string(),
                    format!("Your wallet is ready with {}.", amount(*initial_balance)),
                )
                .await,
            ],
            LedgerEvent::TransferCompleted {
                from_user_id,
                to_user_id,
                amount: value,
                description,
            } => {
                let sender = display_label(identity, *from_user_id, within).await;
                let recipient = display_label(identity, *to_user_id, within).await;
                vec![
                    self.message(
                        event,
                        *from_user_id,
                        "Transfer sent".to_string(),
                        format!("You sent {} to {recipient}: {description}", amount(*value)),
                    )
                    .await,
                    self.message(
                        event,
                        *to_user_id,
                        "Money received".to_string(),
                        format!("You received {} from {sender}: {description}", amount(*value)),
                    )
                    .await,
                ]
            }
            LedgerEvent::FundsDeposited {
                user_id,
                amount: value,
                balance,
                ..
            } => vec![
                self.message(
                    event,
                    *user_id,
                    "Deposit received".to_string(),
                    format!(
                        "{} was added to your wallet. New balance: {}.",
                        amount(*value),
                        amount(*balance)
                    ),
                )
                .await,
            ],
            LedgerEvent::FundsWithdrawn {
                user_id,
                amount: value,
                balance,
                ..
            } => vec![
                self.message(
                    event,
                    *user_id,
                    "Withdrawal processed".to_string(),
                    format!(
                        "{} was withdrawn from your wallet. New balance: {}.",
                        amount(*value),
                        amount(*balance)
                    ),
                )
                .await,
            ],
            LedgerEvent::MoneyRequested {
                requester_id,
                from_user_id,
                amount: value,
                description,
                ..
            } => {
                let requester = display_label(identity, *requester_id, within).await;
                vec![
                    self.message(
                        event,
                        *from_user_id,
                        "Money request".to_string(),
                        format!("{requester} requested {}: {description}", amount(*value)),
                    )
                    .await,
                ]
            }
            LedgerEvent::MoneyRequestApproved {
                requester_id,
                from_user_id,
                amount: value,
                ..
            } => {
                let payer = display_label(identity, *from_user_id, within).await;
                vec![
                    self.message(
                        event,
                        *requester_id,
                        "Money request approved".to_string(),
                        format!("{payer} paid your request for {}.", amount(*value)),
                    )
                    .await,
                ]
            }
            LedgerEvent::MoneyRequestRejected {
                requester_id,
                from_user_id,
                amount: value,
                reason,
                ..
            } => {
                let payer = display_label(identity, *from_user_id, within).await;
                let reason = reason
                    .as_deref()
                    .map(|r| format!(" Reason: {r}"))
                    .unwrap_or_default();
                vec![
                    self.message(
                        event,
                        *requester_id,
                        "Money request declined".to_string(),
                        format!("{payer} declined your request for {}.{reason}", amount(*value)),
                    )
                    .await,
                ]
            }
        }
    }

    async fn message(
        &self,
        event: &LedgerEvent,
        recipient_id: UserId,
        subject: String,
        body: String,
    ) -> Notification {
        Notification {
            event: event.name(),
            recipient_id,
            recipient: display_info_within(self.identity.as_ref(), recipient_id, self.timeout)
                .await,
            subject,
            body,
        }
    }
}

fn amount(value: Decimal) -> String {
    Money::gcoin(value).to_string()
}
