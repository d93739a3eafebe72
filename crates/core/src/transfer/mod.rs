//! Transfer Engine and money request workflow.
//!
//! # Modules
//!
//! - `engine` - Atomic two-sided transfers and request resolution
//! - `request` - Money request types and state machine

pub mod engine;
pub mod request;

#[cfg(test)]
mod engine_props;
#[cfg(test)]
mod request_props;

pub use engine::{TransferEngine, TransferOutcome};
pub use request::{MoneyRequest, MoneyRequestService, MoneyRequestStatus, RequestResolution};
