//! Shared types, errors, and configuration for the G Coin ledger.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination math for history endpoints
//! - Application-wide error types
//! - Configuration management
//! - SMTP email delivery

pub mod config;
pub mod email;
pub mod error;
pub mod types;

pub use config::{AppConfig, EmailConfig, LedgerConfig, NotificationConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
