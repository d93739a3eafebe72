//! Post-commit domain events and best-effort notification delivery.
//!
//! # Modules
//!
//! - `event` - Ledger event types
//! - `publisher` - Bounded outbox fed by committed operations
//! - `dispatcher` - Outbox consumer that renders and delivers messages
//! - `notifier` - Delivery channels (log, SMTP)
//! - `identity` - Display-name lookup for counterparties

pub mod dispatcher;
pub mod event;
pub mod identity;
pub mod notifier;
pub mod publisher;

pub use dispatcher::NotificationDispatcher;
pub use event::LedgerEvent;
pub use identity::{
    DirectoryError, IdentityLookup, StaticDirectory, UserDisplayInfo, display_info_within,
    display_label,
};
pub use notifier::{EmailNotifier, LogNotifier, Notification, Notifier, NotifyError};
pub use publisher::EventPublisher;
