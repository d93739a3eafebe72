//! History Query Service.

pub mod query;
pub mod service;

pub use query::{HistoryParams, HistoryQuery, WILDCARD};
pub use service::{HistoryPage, HistoryService};
