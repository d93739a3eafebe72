//! Bounded outbox between committed ledger units and the dispatcher.

use gcoin_shared::NotificationConfig;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::events::event::LedgerEvent;

/// Publishes events without ever blocking or failing the caller.
#[derive(Debug, Clone, Default)]
pub struct EventPublisher {
    tx: Option<mpsc::Sender<LedgerEvent>>,
}

impl EventPublisher {
    /// Creates a publisher and the receiving end of its outbox.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LedgerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// A publisher that discards every event.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Builds the outbox described by `config`, or a disabled publisher.
    #[must_use]
    pub fn from_config(config: &NotificationConfig) -> (Self, Option<mpsc::Receiver<LedgerEvent>>) {
        if config.enabled {
            let (publisher, rx) = Self::channel(config.channel_capacity);
            (publisher, Some(rx))
        } else {
            (Self::disabled(), None)
        }
    }

    /// Enqueues `event`. A full or closed outbox drops it with a warning.
    pub fn publish(&self, event: LedgerEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        let name = event.name();
        match tx.try_send(event) {
            Ok(()) => debug!(event = name, "Ledger event queued"),
            Err(TrySendError::Full(_)) => {
                warn!(event = name, "Notification outbox full, event dropped");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(event = name, "Notification outbox closed, event dropped");
            }
        }
    }
}
